// self
use crate::{_prelude::*, http::Method, obs::CallKind, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span wrapping one logical API call, retries included.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the call kind, verb, and path.
	pub fn new(kind: CallKind, method: Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"photo_api.call",
				kind = kind.as_str(),
				method = method.as_str(),
				path
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a storage operation that failed without aborting the caller.
pub fn storage_failure(operation: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation, error = %error, "credential storage operation failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, error);
}

/// Logs a scheduled backoff retry.
pub fn retry_scheduled(request_id: &str, attempt: u32, delay: Duration, error: &NormalizedError) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		request_id,
		attempt,
		delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
		kind = error.kind.as_str(),
		status = error.http_status,
		"retrying request after backoff"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (request_id, attempt, delay, error);
}

/// Logs the start of a refresh-token exchange.
pub fn refresh_started(generation: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(generation, "starting refresh-token exchange");
	#[cfg(not(feature = "tracing"))]
	let _ = generation;
}

/// Logs the settled outcome of a refresh-token exchange.
pub fn refresh_finished(generation: u64, error: Option<&NormalizedError>) {
	#[cfg(feature = "tracing")]
	{
		match error {
			None => tracing::debug!(generation, "refresh-token exchange succeeded"),
			Some(e) => tracing::warn!(
				generation,
				kind = e.kind.as_str(),
				status = e.http_status,
				error = %e,
				"refresh-token exchange failed"
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	let _ = (generation, error);
}

/// Logs that the local session was wiped.
pub fn session_cleared(reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::info!(reason, "local session cleared");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}
