// self
use super::{
	Label, RawLink, entries, label_text, lenient_f64, lenient_string, links, location, parse_at,
	root_object, text_or,
};
use crate::{
	_prelude::*,
	auth::MachineId,
	model::{Location, Machine, MachineDetails},
};

const LIST_CONTEXT: &str = "machines";
const DETAIL_CONTEXT: &str = "machine";
const LOCATION_FIELDS: [&str; 2] = ["location", "lastKnownLocation"];

#[derive(Debug, Deserialize)]
struct RawMachine {
	#[serde(default, deserialize_with = "lenient_string")]
	id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	name: Option<String>,
	#[serde(default)]
	model: Option<Label>,
	#[serde(default)]
	category: Option<Label>,
	#[serde(default, rename = "type")]
	kind: Option<Label>,
	#[serde(default)]
	links: Option<Vec<RawLink>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMachineDetails {
	#[serde(default, deserialize_with = "lenient_string")]
	serial_number: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	status: Option<String>,
	#[serde(default, deserialize_with = "lenient_f64")]
	hours_of_operation: Option<f64>,
	#[serde(default, deserialize_with = "lenient_f64")]
	fuel_level: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	last_updated: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	timestamp: Option<String>,
}

/// Normalizes a machine listing.
///
/// Entries without a usable identifier are skipped with a warning; duplicate identifiers keep
/// the first occurrence.
pub fn normalize_machines(payload: &Value) -> Result<Vec<Machine>> {
	let mut seen = HashSet::new();
	let mut machines = Vec::new();

	for (path, entry) in entries(LIST_CONTEXT, payload)? {
		let raw = parse_at::<RawMachine>(LIST_CONTEXT, &path, entry)?;
		let Some(id) = raw.id.as_deref().and_then(|id| MachineId::new(id.trim()).ok()) else {
			log_event!(warn, "Skipping machine entry at {path} without a usable id.");

			continue;
		};

		if !seen.insert(id.clone()) {
			log_event!(debug, "Dropping duplicate machine {id} at {path}.");

			continue;
		}

		machines.push(machine(id, raw, embedded_location(entry)?));
	}

	Ok(machines)
}

/// Normalizes a single machine payload into its detail view.
///
/// `requested` stands in for the identifier when the payload omits one.
pub fn normalize_machine_details(payload: &Value, requested: &MachineId) -> Result<MachineDetails> {
	root_object(DETAIL_CONTEXT, payload)?;

	let raw = parse_at::<RawMachine>(DETAIL_CONTEXT, "", payload)?;
	let details = parse_at::<RawMachineDetails>(DETAIL_CONTEXT, "", payload)?;
	let id = raw
		.id
		.as_deref()
		.and_then(|id| MachineId::new(id.trim()).ok())
		.unwrap_or_else(|| requested.clone());
	let machine = machine(id, raw, embedded_location(payload)?);

	Ok(MachineDetails {
		serial_number: text_or(details.serial_number, || format!("SN-{}", machine.id)),
		status: text_or(details.status, || "ACTIVE".into()),
		hours_of_operation: details.hours_of_operation.unwrap_or(0.),
		fuel_level: details.fuel_level.unwrap_or(0.),
		last_updated: details.last_updated.or(details.timestamp),
		machine,
	})
}

fn machine(id: MachineId, raw: RawMachine, location: Option<Location>) -> Machine {
	let category = text_or(label_text(raw.category), || "UNKNOWN".into());

	Machine {
		name: text_or(raw.name, || format!("Machine {id}")),
		model: text_or(label_text(raw.model), || "Unknown".into()),
		kind: text_or(label_text(raw.kind), || category.clone()),
		category,
		location,
		links: links(raw.links),
		id,
	}
}

fn embedded_location(entry: &Value) -> Result<Option<Location>> {
	for field in LOCATION_FIELDS {
		match entry.get(field) {
			None | Some(Value::Null) => continue,
			Some(value) =>
				if let Some(location) = location::normalize_location(value)? {
					return Ok(Some(location));
				},
		}
	}

	Ok(None)
}
