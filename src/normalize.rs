//! Pure conversions from upstream JSON into canonical entities.
//!
//! Nothing here performs I/O. Missing optional fields resolve to placeholders; only structural
//! violations (a `values` member that is not a sequence, non-object entries, coordinates that
//! are not numbers, wrongly typed fields) produce [`Error::MalformedResponse`].
//!
//! Collections accept three envelopes: `{"values": [...]}`, a bare array, and `null` or an
//! object without `values` (both meaning "no entries").

mod alert;
mod engine_hours;
mod location;
mod machine;
mod organization;

pub use alert::{SEVERITY_BUCKETS, normalize_alert_definition, normalize_alerts, severity_from_text};
pub use engine_hours::normalize_engine_hours;
pub use location::{TIMESTAMP_FIELDS, normalize_location};
pub use machine::{normalize_machine_details, normalize_machines};
pub use organization::normalize_organizations;

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
use serde_json::Map;
// self
use crate::{_prelude::*, model::Link};

/// Parsed `{rel, uri}` link; entries without a URI are dropped.
#[derive(Debug, Deserialize)]
struct RawLink {
	#[serde(default, deserialize_with = "lenient_string")]
	rel: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	uri: Option<String>,
}

/// Either a bare string or an object carrying a `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Label {
	Text(String),
	Named {
		#[serde(default, deserialize_with = "lenient_string")]
		name: Option<String>,
	},
}
impl Label {
	fn into_text(self) -> Option<String> {
		match self {
			Label::Text(text) => non_blank(Some(text)),
			Label::Named { name } => non_blank(name),
		}
	}
}

fn label_text(label: Option<Label>) -> Option<String> {
	label.and_then(Label::into_text)
}

fn links(raw: Option<Vec<RawLink>>) -> Vec<Link> {
	raw.unwrap_or_default()
		.into_iter()
		.filter_map(|link| {
			let uri = non_blank(link.uri)?;

			Some(Link { rel: link.rel.unwrap_or_default(), uri })
		})
		.collect()
}

/// Entries of a collection payload, each verified to be an object, paired with their JSON path.
fn entries<'v>(
	context: &'static str,
	payload: &'v Value,
) -> Result<Vec<(String, &'v Value)>> {
	let (prefix, items) = match payload {
		Value::Null => return Ok(Vec::new()),
		Value::Array(items) => ("", items),
		Value::Object(object) => match object.get("values") {
			None | Some(Value::Null) => return Ok(Vec::new()),
			Some(Value::Array(items)) => ("values", items),
			Some(_) => return Err(malformed(context, "values", "expected a sequence")),
		},
		_ => return Err(malformed(context, ".", "expected an object or a sequence")),
	};

	items
		.iter()
		.enumerate()
		.map(|(index, item)| {
			let path = format!("{prefix}[{index}]");

			match item {
				Value::Object(_) => Ok((path, item)),
				_ => Err(malformed(context, path, "expected an object")),
			}
		})
		.collect()
}

/// Root object of a single-resource payload.
fn root_object<'v>(context: &'static str, payload: &'v Value) -> Result<&'v Map<String, Value>> {
	payload.as_object().ok_or_else(|| malformed(context, ".", "expected an object"))
}

/// Deserializes `value`, reporting failures relative to `prefix`.
fn parse_at<T>(context: &'static str, prefix: &str, value: &Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|err| {
		let inner_path = err.path().to_string();
		let path = match (prefix.is_empty(), inner_path.as_str()) {
			(true, _) => inner_path.clone(),
			(false, ".") => prefix.to_owned(),
			(false, inner) => format!("{prefix}.{inner}"),
		};

		Error::MalformedResponse { context, path, message: err.into_inner().to_string() }
	})
}

fn malformed(context: &'static str, path: impl Into<String>, message: &str) -> Error {
	Error::MalformedResponse { context, path: path.into(), message: message.to_owned() }
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|text| !text.trim().is_empty())
}

fn text_or(value: Option<String>, fallback: impl FnOnce() -> String) -> String {
	non_blank(value).unwrap_or_else(fallback)
}

/// Accepts strings and numbers (upstream ids flip between the two), treating `null` as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => Ok(Some(text)),
		Some(Value::Number(number)) => Ok(Some(number.to_string())),
		Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
		Some(_) => Err(serde::de::Error::custom("expected a string or a number")),
	}
}

/// Accepts numbers and numeric strings, treating `null` as absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => number
			.as_f64()
			.map(Some)
			.ok_or_else(|| serde::de::Error::custom("number is out of range")),
		Some(Value::String(text)) => text
			.trim()
			.parse::<f64>()
			.map(Some)
			.map_err(|_| serde::de::Error::custom("expected a numeric string")),
		Some(_) => Err(serde::de::Error::custom("expected a number")),
	}
}
