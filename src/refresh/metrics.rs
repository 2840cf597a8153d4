// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by [`SingleFlightRefresh`](crate::refresh::SingleFlightRefresh).
///
/// `attempts == successes + failures` once every started exchange has settled.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	started: AtomicU64,
	refreshed: AtomicU64,
	failed: AtomicU64,
	joined: AtomicU64,
	late: AtomicU64,
}
impl RefreshMetrics {
	/// Exchanges started; joined waiters are not counted.
	pub fn attempts(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Exchanges that stored a new credential.
	pub fn successes(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Exchanges that failed and cleared the session.
	pub fn failures(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Callers that attached to an exchange another request had already started.
	pub fn joins(&self) -> u64 {
		self.joined.load(Ordering::Relaxed)
	}

	/// Callers whose `401` arrived after an exchange had already replaced their token.
	pub fn late_resends(&self) -> u64 {
		self.late.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		bump(&self.started);
	}

	pub(crate) fn record_success(&self) {
		bump(&self.refreshed);
	}

	pub(crate) fn record_failure(&self) {
		bump(&self.failed);
	}

	pub(crate) fn record_join(&self) {
		bump(&self.joined);
	}

	pub(crate) fn record_late_resend(&self) {
		bump(&self.late);
	}
}

fn bump(counter: &AtomicU64) {
	counter.fetch_add(1, Ordering::Relaxed);
}
