// self
use super::{Label, RawLink, entries, label_text, lenient_string, links, parse_at, text_or};
use crate::{_prelude::*, auth::OrganizationId, model::Organization};

const CONTEXT: &str = "organizations";

#[derive(Debug, Deserialize)]
struct RawOrganization {
	#[serde(default, deserialize_with = "lenient_string")]
	id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	name: Option<String>,
	#[serde(default, rename = "type")]
	kind: Option<Label>,
	#[serde(default)]
	links: Option<Vec<RawLink>>,
}

/// Normalizes an organization listing.
///
/// Entries without a usable identifier are skipped with a warning.
pub fn normalize_organizations(payload: &Value) -> Result<Vec<Organization>> {
	let mut organizations = Vec::new();

	for (path, entry) in entries(CONTEXT, payload)? {
		let raw = parse_at::<RawOrganization>(CONTEXT, &path, entry)?;
		let Some(id) = raw.id.and_then(|id| OrganizationId::new(id.trim()).ok()) else {
			log_event!(warn, "Skipping organization entry at {path} without a usable id.");

			continue;
		};
		let name = text_or(raw.name, || format!("Organization {id}"));

		organizations.push(Organization {
			name,
			kind: text_or(label_text(raw.kind), || "UNKNOWN".into()),
			links: links(raw.links),
			id,
		});
	}

	Ok(organizations)
}
