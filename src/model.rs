//! Canonical entities handed to the route layer.
//!
//! Every display field is populated (placeholders stand in for missing upstream values) and
//! the serialized form uses the same camelCase keys the normalizer accepts, so feeding a
//! serialized entity back through [`crate::normalize`] yields the same value.

// self
use crate::{
	_prelude::*,
	auth::{MachineId, OrganizationId},
};

/// Hypermedia link carried by upstream resources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	/// Relation name.
	pub rel: String,
	/// Target URI.
	pub uri: String,
}

/// Organization visible to the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
	/// Upstream identifier.
	pub id: OrganizationId,
	/// Display name (`Organization <id>` when absent).
	pub name: String,
	/// Organization type (`UNKNOWN` when absent).
	#[serde(rename = "type")]
	pub kind: String,
	/// Hypermedia links.
	pub links: Vec<Link>,
}

/// Geographic fix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
	/// Latitude in decimal degrees.
	pub latitude: f64,
	/// Longitude in decimal degrees.
	pub longitude: f64,
	/// Upstream timestamp, verbatim.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
}

/// Machine listed under an organization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
	/// Upstream identifier.
	pub id: MachineId,
	/// Display name (`Machine <id>` when absent).
	pub name: String,
	/// Model name (`Unknown` when absent).
	pub model: String,
	/// Equipment category (`UNKNOWN` when absent).
	pub category: String,
	/// Equipment type (falls back to the category).
	#[serde(rename = "type")]
	pub kind: String,
	/// Last known position, if the machine ever reported one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<Location>,
	/// Hypermedia links.
	pub links: Vec<Link>,
}

/// Machine detail view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDetails {
	/// Fields shared with [`Machine`].
	#[serde(flatten)]
	pub machine: Machine,
	/// Serial number (`SN-<id>` when absent).
	pub serial_number: String,
	/// Operational status (`ACTIVE` when absent).
	pub status: String,
	/// Accumulated operating hours (0 when absent).
	pub hours_of_operation: f64,
	/// Fuel level in percent (0 when absent).
	pub fuel_level: f64,
	/// Last upstream update, verbatim.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_updated: Option<String>,
}

/// Alert severity bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	/// Critical, error, or high.
	Critical,
	/// Warning or medium.
	Warning,
	/// Low.
	Low,
	/// Informational.
	Info,
	/// Diagnostic trouble code.
	Dtc,
	/// Missing or unrecognized upstream severity.
	Unknown,
}
impl Severity {
	/// Returns the canonical lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Severity::Critical => "critical",
			Severity::Warning => "warning",
			Severity::Low => "low",
			Severity::Info => "info",
			Severity::Dtc => "dtc",
			Severity::Unknown => "unknown",
		}
	}
}
impl Display for Severity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Alert raised by a machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
	/// Upstream identifier.
	pub id: String,
	/// Title (`Untitled alert` when absent).
	pub title: String,
	/// Description (`No description` when absent).
	pub description: String,
	/// Normalized severity.
	pub severity: Severity,
	/// Alert status (`ACTIVE` when absent).
	pub status: String,
	/// Alert type (`UNDEFINED` when absent).
	#[serde(rename = "type")]
	pub kind: String,
	/// Upstream timestamp, verbatim.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	/// URI of the detailed alert definition.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub definition_uri: Option<String>,
}

/// Detailed explanation of an alert, fetched lazily through [`Alert::definition_uri`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
	/// Upstream identifier (empty when absent).
	pub id: String,
	/// Title (`Untitled alert` when absent).
	pub title: String,
	/// Description (`No description` when absent).
	pub description: String,
	/// Possible causes.
	pub causes: Vec<String>,
	/// Suggested resolutions.
	pub resolutions: Vec<String>,
	/// Free-form additional information.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_info: Option<String>,
}

/// Most recent engine-hour reading of a machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineHours {
	/// Reading value.
	pub hours: f64,
	/// Reading unit (`Hours` when absent).
	pub unit: String,
	/// Upstream timestamp, verbatim.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
}
