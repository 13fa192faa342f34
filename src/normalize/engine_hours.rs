// self
use super::{lenient_f64, lenient_string, non_blank, parse_at, text_or};
use crate::{_prelude::*, model::EngineHours};

const CONTEXT: &str = "engine hours";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReading {
	#[serde(default, deserialize_with = "lenient_f64")]
	value_as_double: Option<f64>,
	#[serde(default, deserialize_with = "lenient_f64")]
	value: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEngineHours {
	#[serde(default)]
	reading: Option<RawReading>,
	#[serde(default, deserialize_with = "lenient_f64")]
	hours: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	unit: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	report_time: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	timestamp: Option<String>,
}
impl RawEngineHours {
	fn into_reading(self) -> Option<EngineHours> {
		let reading = self.reading.unwrap_or_default();
		let hours = reading.value_as_double.or(reading.value).or(self.hours)?;

		Some(EngineHours {
			hours,
			unit: text_or(non_blank(reading.unit).or(self.unit), || "Hours".into()),
			timestamp: non_blank(self.report_time).or(non_blank(self.timestamp)),
		})
	}
}

/// Normalizes an engine-hours payload, keeping the most recent reading.
///
/// Accepts a `values` list of `{reading: {valueAsDouble, unit}, reportTime}` entries or a
/// single flat `{hours, unit, timestamp}` object. Readings without a timestamp rank oldest.
pub fn normalize_engine_hours(payload: &Value) -> Result<Option<EngineHours>> {
	let candidates = match payload {
		Value::Object(object) if !object.contains_key("values") =>
			vec![parse_at::<RawEngineHours>(CONTEXT, "", payload)?],
		_ => super::entries(CONTEXT, payload)?
			.into_iter()
			.map(|(path, entry)| parse_at::<RawEngineHours>(CONTEXT, &path, entry))
			.collect::<Result<Vec<_>>>()?,
	};
	let mut best: Option<EngineHours> = None;

	for candidate in candidates.into_iter().filter_map(RawEngineHours::into_reading) {
		if best.as_ref().is_none_or(|current| candidate.timestamp > current.timestamp) {
			best = Some(candidate);
		}
	}

	Ok(best)
}
