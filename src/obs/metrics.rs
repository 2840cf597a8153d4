//! Metric names and recorders; every recorder is a no-op without the `metrics` feature.

// self
use crate::{
	_prelude::*,
	obs::{CallKind, CallOutcome},
};

/// Counter of call outcomes, labeled by `kind` and `outcome`.
pub const CALL_TOTAL: &str = "photo_api_call_total";
/// Histogram of scheduled backoff delays in seconds, labeled by `kind`.
pub const RETRY_DELAY_SECONDS: &str = "photo_api_retry_delay_seconds";
/// Histogram of successful call durations in seconds, labeled by `kind`.
pub const CALL_DURATION_SECONDS: &str = "photo_api_call_duration_seconds";
/// Counter of local session wipes, labeled by `reason`.
pub const SESSION_CLEARED_TOTAL: &str = "photo_api_session_cleared_total";

/// Counts one call outcome.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(CALL_TOTAL, "kind" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the delay chosen for a backoff retry.
pub fn record_retry_delay(kind: CallKind, delay: Duration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!(RETRY_DELAY_SECONDS, "kind" => kind.as_str()).record(delay.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, delay);
}

/// Records how long the successful attempt of a call took.
pub fn record_call_duration(kind: CallKind, duration: Duration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!(CALL_DURATION_SECONDS, "kind" => kind.as_str())
		.record(duration.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, duration);
}

/// Counts a local session wipe.
pub fn record_session_cleared(reason: &'static str) {
	#[cfg(feature = "metrics")]
	metrics::counter!(SESSION_CLEARED_TOTAL, "reason" => reason).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = reason;
}
