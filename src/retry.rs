//! Backoff retry classification.
//!
//! [`RetryPolicy`] is a pure decision function: it never sleeps and never touches the network.
//! The client asks it whether a failed attempt deserves another try and, if so, how long to wait.

// self
use crate::_prelude::*;

/// Bounded exponential backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
	/// Upper bound on total attempts, including the initial request.
	pub max_attempts: u32,
	/// Delay before the second attempt.
	#[serde(with = "millis")]
	pub base_delay: Duration,
	/// Growth factor applied per additional attempt.
	pub multiplier: f64,
	/// Ceiling for any single delay.
	#[serde(with = "millis")]
	pub max_delay: Duration,
}
impl RetryPolicy {
	/// Attempts allowed when nothing else is configured.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
	/// Base delay used when nothing else is configured.
	pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
	/// Multiplier used when nothing else is configured.
	pub const DEFAULT_MULTIPLIER: f64 = 2.0;
	/// Delay ceiling used when nothing else is configured.
	pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

	/// Creates a policy with the given budget and the default timing.
	pub fn new(max_attempts: u32) -> Self {
		Self { max_attempts, ..Self::default() }
	}

	/// Overrides the base delay.
	pub fn with_base_delay(mut self, delay: Duration) -> Self {
		self.base_delay = delay;

		self
	}

	/// Overrides the multiplier.
	pub fn with_multiplier(mut self, multiplier: f64) -> Self {
		self.multiplier = multiplier;

		self
	}

	/// Overrides the delay ceiling.
	pub fn with_max_delay(mut self, delay: Duration) -> Self {
		self.max_delay = delay;

		self
	}

	/// Decides whether the failure observed on `attempt` (1-based) deserves another attempt.
	pub fn should_retry(&self, error: &NormalizedError, attempt: u32) -> bool {
		if matches!(error.kind, ErrorKind::Timeout | ErrorKind::Cancelled) {
			return false;
		}
		// Without a status only network-level failures are transient; a request that could not
		// be built fails the same way on every attempt.
		if error.http_status.is_none() && !error.retryable {
			return false;
		}

		self.should_retry_status(error.http_status, attempt)
	}

	/// Same rule as [`RetryPolicy::should_retry`] applied to a bare HTTP status.
	pub fn should_retry_status(&self, status: Option<u16>, attempt: u32) -> bool {
		attempt < self.max_attempts && is_retryable_status(status)
	}

	/// Delay before the attempt following `attempt`: `base * multiplier^(attempt - 1)`.
	///
	/// The result is additionally capped at `max_delay` (30 s by default), which departs from the
	/// plain exponential only when the attempt budget is large enough to reach the cap.
	pub fn compute_delay(&self, attempt: u32) -> Duration {
		let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
		let nanos = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);

		if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
			return self.max_delay;
		}

		Duration::from_nanos(nanos.round() as u64)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			base_delay: Self::DEFAULT_BASE_DELAY,
			multiplier: Self::DEFAULT_MULTIPLIER,
			max_delay: Self::DEFAULT_MAX_DELAY,
		}
	}
}

/// Status classification shared by the policy and [`NormalizedError`]: 408/429 among client
/// errors, every server error, and failures without any status are transient.
pub fn is_retryable_status(status: Option<u16>) -> bool {
	match status {
		None => true,
		Some(408 | 429) => true,
		Some(400..=499) => false,
		Some(code) => code >= 500,
	}
}

mod millis {
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn status_error(status: u16) -> NormalizedError {
		NormalizedError::from_status(status, b"")
	}

	#[test]
	fn classification_follows_status_classes() {
		let policy = RetryPolicy::new(3);

		assert!(policy.should_retry(&status_error(429), 1));
		assert!(policy.should_retry(&status_error(408), 1));
		assert!(!policy.should_retry(&status_error(400), 1));
		assert!(!policy.should_retry(&status_error(404), 1));
		assert!(policy.should_retry(&status_error(500), 1));
		assert!(policy.should_retry(&status_error(504), 2));
		assert!(policy.should_retry(&NormalizedError::network("connection refused"), 1));
	}

	#[test]
	fn budget_is_exhausted_at_max_attempts() {
		let policy = RetryPolicy::new(3);

		assert!(policy.should_retry(&status_error(500), 2));
		assert!(!policy.should_retry(&status_error(500), 3));
		assert!(!policy.should_retry_status(Some(503), 4));
	}

	#[test]
	fn timeouts_and_cancellations_are_terminal() {
		let policy = RetryPolicy::new(5);

		assert!(!policy.should_retry(&NormalizedError::timeout(), 1));
		assert!(!policy.should_retry(&NormalizedError::cancelled(), 1));
	}

	#[test]
	fn request_build_failures_are_terminal() {
		let policy = RetryPolicy::new(5);
		let error = NormalizedError::from(crate::error::TransportError::request(std::io::Error::new(
			std::io::ErrorKind::InvalidInput,
			"invalid header value",
		)));

		assert_eq!(error.http_status, None);
		assert!(!policy.should_retry(&error, 1));
	}

	#[test]
	fn delay_grows_exponentially_from_base() {
		let policy = RetryPolicy::new(5)
			.with_base_delay(Duration::from_millis(100))
			.with_multiplier(3.0);

		assert_eq!(policy.compute_delay(1), Duration::from_millis(100));
		assert_eq!(policy.compute_delay(2), Duration::from_millis(300));
		assert_eq!(policy.compute_delay(3), Duration::from_millis(900));
	}

	#[test]
	fn delay_is_capped() {
		let policy = RetryPolicy::new(64)
			.with_base_delay(Duration::from_secs(1))
			.with_max_delay(Duration::from_secs(5));

		assert_eq!(policy.compute_delay(10), Duration::from_secs(5));
		assert_eq!(policy.compute_delay(u32::MAX), Duration::from_secs(5));
	}
}
