// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-manager refresh counters, readable by the dashboard's diagnostics panel.
///
/// Synthetic renewals count as attempts and successes and are also tallied on their own, so
/// `successes() - local_renewals()` is the number of token-endpoint refreshes that worked.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	expired: AtomicU64,
	replaced: AtomicU64,
	rejected: AtomicU64,
	local_renewals: AtomicU64,
}
impl RefreshMetrics {
	/// Tokens that reached the refresh path because they had expired.
	pub fn attempts(&self) -> u64 {
		self.expired.load(Ordering::Relaxed)
	}

	/// Expired tokens that were replaced.
	pub fn successes(&self) -> u64 {
		self.replaced.load(Ordering::Relaxed)
	}

	/// Refreshes that failed, whether locally or at the token endpoint.
	pub fn failures(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Expired synthetic tokens renewed without a network call.
	pub fn local_renewals(&self) -> u64 {
		self.local_renewals.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.expired.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.replaced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_local_renewal(&self) {
		self.local_renewals.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_independent() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_attempt();
		metrics.record_failure();
		metrics.record_success();
		metrics.record_local_renewal();

		assert_eq!(
			(metrics.attempts(), metrics.successes(), metrics.failures(), metrics.local_renewals()),
			(2, 1, 1, 1)
		);
	}
}
