//! Optional observability helpers for lifecycle and upstream calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `telematics_broker.call`
//!   with the `call` (operation) and `stage` (call site) fields, plus the crate's diagnostic
//!   events.
//! - Enable `metrics` to increment the `telematics_broker_call_total` counter for every
//!   attempt/success/degraded/failure, labeled by `call` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Authorization-code exchange.
	TokenExchange,
	/// Refresh-token grant.
	TokenRefresh,
	/// Token revocation at logout.
	TokenRevoke,
	/// Organization listing.
	Organizations,
	/// Machine listing for one organization.
	Machines,
	/// Single machine detail.
	Machine,
	/// Machine location lookup.
	MachineLocation,
	/// Machine alert listing.
	MachineAlerts,
	/// Alert definition lookup.
	AlertDefinition,
	/// Engine-hour lookup.
	EngineHours,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::TokenExchange => "token_exchange",
			CallKind::TokenRefresh => "token_refresh",
			CallKind::TokenRevoke => "token_revoke",
			CallKind::Organizations => "organizations",
			CallKind::Machines => "machines",
			CallKind::Machine => "machine",
			CallKind::MachineLocation => "machine_location",
			CallKind::MachineAlerts => "machine_alerts",
			CallKind::AlertDefinition => "alert_definition",
			CallKind::EngineHours => "engine_hours",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Short-circuited by the degraded-mode guard.
	Degraded,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Degraded => "degraded",
			CallOutcome::Failure => "failure",
		}
	}

	/// Terminal outcome for a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => CallOutcome::Success,
			Err(Error::DegradedMode(_)) => CallOutcome::Degraded,
			Err(_) => CallOutcome::Failure,
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
