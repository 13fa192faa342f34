// self
use super::{
	Label, RawLink, entries, label_text, lenient_string, non_blank, parse_at, root_object, text_or,
};
use crate::{
	_prelude::*,
	model::{Alert, AlertDefinition, Severity},
};

/// Substring buckets checked in order against the lowercased upstream severity.
pub const SEVERITY_BUCKETS: [(Severity, &[&str]); 5] = [
	(Severity::Critical, &["critical", "error", "high"]),
	(Severity::Warning, &["warning", "warn", "medium"]),
	(Severity::Low, &["low"]),
	(Severity::Info, &["info"]),
	(Severity::Dtc, &["dtc"]),
];

const LIST_CONTEXT: &str = "alerts";
const DEFINITION_CONTEXT: &str = "alert definition";
const DEFINITION_RELS: [&str; 2] = ["definition", "alertDefinition"];
const UNTITLED: &str = "Untitled alert";
const UNDESCRIBED: &str = "No description";

#[derive(Debug, Default, Deserialize)]
struct RawContent {
	#[serde(default, deserialize_with = "lenient_string")]
	title: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAlert {
	#[serde(default, deserialize_with = "lenient_string")]
	id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	title: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	description: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	message: Option<String>,
	#[serde(default)]
	content: Option<RawContent>,
	#[serde(default, deserialize_with = "lenient_string")]
	severity: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	status: Option<String>,
	#[serde(default, rename = "type")]
	kind: Option<Label>,
	#[serde(default, deserialize_with = "lenient_string")]
	timestamp: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	time: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	definition_uri: Option<String>,
	#[serde(default)]
	links: Option<Vec<RawLink>>,
}

/// Cause or resolution, given either as text or as an object with a description.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNote {
	Text(String),
	Described {
		#[serde(default, deserialize_with = "lenient_string")]
		description: Option<String>,
		#[serde(default, deserialize_with = "lenient_string")]
		title: Option<String>,
	},
}
impl RawNote {
	fn into_text(self) -> Option<String> {
		match self {
			RawNote::Text(text) => non_blank(Some(text)),
			RawNote::Described { description, title } => non_blank(description).or(non_blank(title)),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
	#[serde(default, deserialize_with = "lenient_string")]
	id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	title: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	description: Option<String>,
	#[serde(default)]
	causes: Option<Vec<RawNote>>,
	#[serde(default)]
	resolutions: Option<Vec<RawNote>>,
	#[serde(default, deserialize_with = "lenient_string")]
	additional_info: Option<String>,
}

/// Maps an upstream severity label onto a canonical bucket.
///
/// Matching is case-insensitive and substring based; the first bucket in
/// [`SEVERITY_BUCKETS`] that matches wins and anything else is [`Severity::Unknown`].
pub fn severity_from_text(raw: Option<&str>) -> Severity {
	let Some(raw) = raw else {
		return Severity::Unknown;
	};
	let lowered = raw.to_lowercase();

	SEVERITY_BUCKETS
		.iter()
		.find(|(_, needles)| needles.iter().any(|needle| lowered.contains(needle)))
		.map_or(Severity::Unknown, |(severity, _)| *severity)
}

/// Normalizes a machine alert listing.
///
/// Alerts without an identifier are kept with an empty `id` so no alert is hidden from the
/// operator.
pub fn normalize_alerts(payload: &Value) -> Result<Vec<Alert>> {
	entries(LIST_CONTEXT, payload)?
		.into_iter()
		.map(|(path, entry)| parse_at::<RawAlert>(LIST_CONTEXT, &path, entry).map(alert))
		.collect()
}

/// Normalizes the payload behind an alert's definition URI.
pub fn normalize_alert_definition(payload: &Value) -> Result<AlertDefinition> {
	root_object(DEFINITION_CONTEXT, payload)?;

	let raw = parse_at::<RawDefinition>(DEFINITION_CONTEXT, "", payload)?;

	Ok(AlertDefinition {
		id: raw.id.unwrap_or_default(),
		title: text_or(raw.title, || UNTITLED.into()),
		description: text_or(raw.description, || UNDESCRIBED.into()),
		causes: notes(raw.causes),
		resolutions: notes(raw.resolutions),
		additional_info: non_blank(raw.additional_info),
	})
}

fn alert(raw: RawAlert) -> Alert {
	let content = raw.content.unwrap_or_default();
	let definition_uri = non_blank(raw.definition_uri).or_else(|| {
		raw.links.unwrap_or_default().into_iter().find_map(|link| {
			let rel = link.rel?;

			DEFINITION_RELS.contains(&rel.as_str()).then_some(non_blank(link.uri)).flatten()
		})
	});

	Alert {
		id: raw.id.unwrap_or_default(),
		title: text_or(non_blank(raw.title).or(non_blank(content.title)).or(raw.message), || {
			UNTITLED.into()
		}),
		description: text_or(non_blank(raw.description).or(content.description), || {
			UNDESCRIBED.into()
		}),
		severity: severity_from_text(raw.severity.as_deref()),
		status: text_or(raw.status, || "ACTIVE".into()),
		kind: text_or(label_text(raw.kind), || "UNDEFINED".into()),
		timestamp: non_blank(raw.timestamp).or(non_blank(raw.time)),
		definition_uri,
	}
}

fn notes(raw: Option<Vec<RawNote>>) -> Vec<String> {
	raw.unwrap_or_default().into_iter().filter_map(RawNote::into_text).collect()
}
