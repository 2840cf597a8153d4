//! Per-call knobs: extra headers, query parameters, cancellation, progress, and timeout.

// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, http::ProgressReporter};

/// Cancels one or more in-flight calls.
///
/// Cancelling resolves every call holding this handle with [`ErrorKind::Cancelled`], including
/// calls parked in a backoff delay or waiting on a shared token refresh.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(CancellationToken);
impl CancelHandle {
	/// Creates a fresh, uncancelled handle.
	pub fn new() -> Self {
		Self::default()
	}

	/// Signals cancellation.
	pub fn cancel(&self) {
		self.0.cancel();
	}

	/// `true` once [`CancelHandle::cancel`] ran.
	pub fn is_cancelled(&self) -> bool {
		self.0.is_cancelled()
	}

	/// Resolves `fut` unless the handle fires first.
	pub(crate) async fn guard<F>(handle: Option<&Self>, fut: F) -> Result<F::Output, NormalizedError>
	where
		F: Future,
	{
		let Some(handle) = handle else {
			return Ok(fut.await);
		};

		tokio::select! {
			biased;
			_ = handle.0.cancelled() => Err(NormalizedError::cancelled()),
			output = fut => Ok(output),
		}
	}
}

/// Optional per-call settings.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	pub(crate) headers: BTreeMap<String, String>,
	pub(crate) query: Vec<(String, String)>,
	pub(crate) cancel: Option<CancelHandle>,
	pub(crate) progress: Option<ProgressReporter>,
	pub(crate) timeout: Option<Duration>,
}
impl RequestOptions {
	/// Starts with no overrides.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a header that overrides any default with the same (case-insensitive) name.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(crate::http::header_key(name.as_ref()), value.into());

		self
	}

	/// Appends a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((name.into(), value.to_string()));

		self
	}

	/// Ties the call to a cancellation handle.
	pub fn cancel_with(mut self, handle: &CancelHandle) -> Self {
		self.cancel = Some(handle.clone());

		self
	}

	/// Receives transfer progress percentages for uploads and downloads.
	pub fn on_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
		self.progress = Some(ProgressReporter::new(callback));

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}
