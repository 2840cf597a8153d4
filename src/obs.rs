//! Optional observability helpers for API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to run every call inside a `photo_api.call` span carrying
//!   the `kind`, `method`, and `path` fields, and to emit structured events for retries, token
//!   refreshes, session clears, and storage failures.
//! - Enable `metrics` to record call outcomes, backoff delays, call durations, and session wipes
//!   under the `photo_api_` prefix (see the constants in this module).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Call categories observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// JSON request/response call.
	Json,
	/// Multipart upload.
	Upload,
	/// Binary download.
	Download,
	/// Refresh-token exchange.
	Refresh,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Json => "json",
			CallKind::Upload => "upload",
			CallKind::Download => "download",
			CallKind::Refresh => "refresh",
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
	/// Entry to a call.
	Attempt,
	/// Successful completion.
	Success,
	/// A backoff retry was scheduled.
	Retry,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Retry => "retry",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
