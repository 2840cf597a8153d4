//! Single-flight refresh-token exchange.
//!
//! Every request that receives a `401` funnels into [`SingleFlightRefresh::refresh`]. The first
//! caller installs a shared future in the pending slot; callers arriving while it runs clone and
//! await the same future, so the backend sees exactly one `POST /auth/refresh` however many
//! requests failed at once. Each successful exchange bumps a generation counter. A request
//! remembers the generation it was sent under, which lets a `401` that arrives after the exchange
//! already settled resend with the new token instead of starting another exchange.
//!
//! The exchange itself runs on a spawned tokio task. Waiters hold a shared handle to its outcome,
//! so cancelling any of them, the first one included, never stalls the exchange.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenGrant},
	http::{HttpBackend, Method, RawRequest, RequestBody},
	obs::{self, CallKind, CallOutcome},
	store::TokenStore,
};

type SharedRefresh = Shared<BoxFuture<'static, Result<Credential, NormalizedError>>>;

struct PendingRefresh {
	key: u64,
	future: SharedRefresh,
}

/// Outcome of joining the refresh gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// An exchange ran (or was joined) and stored a new credential.
	Refreshed,
	/// An exchange completed after the request was sent; its token is already stored.
	AlreadyRefreshed,
}

/// Coordinates refresh-token exchanges so at most one is in flight.
///
/// Clones share the pending slot, the generation counter, and the metrics.
#[derive(Clone, Default)]
pub struct SingleFlightRefresh {
	pending: Arc<Mutex<Option<PendingRefresh>>>,
	generation: Arc<AtomicU64>,
	next_key: Arc<AtomicU64>,
	metrics: Arc<RefreshMetrics>,
}
impl SingleFlightRefresh {
	/// Creates an idle gate.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of successful exchanges so far.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::SeqCst)
	}

	/// `true` while an exchange is in flight.
	pub fn is_pending(&self) -> bool {
		self.pending.lock().is_some()
	}

	/// Exchange counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Joins the pending exchange or starts one via `exchange`.
	///
	/// `observed_generation` is the value of [`SingleFlightRefresh::generation`] captured before
	/// the failed request read its token. `exchange` is only invoked when a new exchange starts.
	/// The exchange runs on its own tokio task, so dropping the returned future only drops this
	/// caller's handle: the exchange still settles and stores its credential.
	pub async fn refresh<F, Fut>(
		&self,
		observed_generation: u64,
		exchange: F,
	) -> Result<RefreshOutcome, NormalizedError>
	where
		F: FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = Result<Credential, NormalizedError>>,
	{
		let future = {
			let mut slot = self.pending.lock();

			match slot.as_ref() {
				Some(pending) => {
					self.metrics.record_join();

					pending.future.clone()
				},
				None if self.generation() != observed_generation => {
					self.metrics.record_late_resend();

					return Ok(RefreshOutcome::AlreadyRefreshed);
				},
				None => {
					let key = self.next_key.fetch_add(1, Ordering::Relaxed);
					let future = self.start(key, exchange());

					*slot = Some(PendingRefresh { key, future: future.clone() });

					future
				},
			}
		};

		future.await.map(|_| RefreshOutcome::Refreshed)
	}

	fn start<Fut>(&self, key: u64, exchange: Fut) -> SharedRefresh
	where
		Fut: 'static + Send + Future<Output = Result<Credential, NormalizedError>>,
	{
		let pending = Arc::clone(&self.pending);
		let generation = Arc::clone(&self.generation);
		let metrics = Arc::clone(&self.metrics);
		// The exchange owns its task so it settles even after every waiter went away.
		let task = tokio::spawn({
			let pending = Arc::clone(&pending);

			async move {
				let started_at = generation.load(Ordering::SeqCst);

				metrics.record_attempt();
				obs::refresh_started(started_at);
				obs::record_call_outcome(CallKind::Refresh, CallOutcome::Attempt);

				let result = exchange.await;

				{
					let mut slot = pending.lock();

					match &result {
						Ok(_) => {
							generation.fetch_add(1, Ordering::SeqCst);
							metrics.record_success();
						},
						Err(_) => metrics.record_failure(),
					}

					release_slot(&mut slot, key);
				}

				obs::refresh_finished(started_at, result.as_ref().err());
				obs::record_call_outcome(
					CallKind::Refresh,
					if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure },
				);

				result
			}
		});

		async move {
			task.await.unwrap_or_else(|e| {
				release_slot(&mut pending.lock(), key);

				Err(NormalizedError {
					message: format!("Refresh-token exchange stopped: {e}."),
					..NormalizedError::new(ErrorKind::Unknown)
				})
			})
		}
		.boxed()
		.shared()
	}
}
impl Debug for SingleFlightRefresh {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SingleFlightRefresh")
			.field("generation", &self.generation())
			.field("pending", &self.is_pending())
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn release_slot(slot: &mut Option<PendingRefresh>, key: u64) {
	if slot.as_ref().is_some_and(|p| p.key == key) {
		*slot = None;
	}
}

/// One `POST /auth/refresh` round trip plus its effect on the credential store.
pub(crate) struct RefreshExchange {
	pub(crate) backend: Arc<dyn HttpBackend>,
	pub(crate) store: TokenStore,
	pub(crate) url: Url,
	pub(crate) headers: BTreeMap<String, String>,
	pub(crate) timeout: Duration,
}
impl RefreshExchange {
	/// Runs the exchange; any failure wipes the local session before it is reported.
	pub(crate) async fn run(self) -> Result<Credential, NormalizedError> {
		let result = self.exchange().await;

		if result.is_err() {
			// Per-key failures are already logged by the store.
			let _ = self.store.clear_all().await;

			obs::session_cleared("refresh_failed");
			obs::record_session_cleared("refresh_failed");
		}

		result
	}

	async fn exchange(&self) -> Result<Credential, NormalizedError> {
		let refresh_token = self
			.store
			.get_refresh_token()
			.await?
			.filter(|token| !token.is_blank())
			.ok_or_else(|| NormalizedError::authentication("No refresh token is available."))?;
		let request = RawRequest {
			method: Method::Post,
			url: self.url.clone(),
			headers: self.headers.clone(),
			body: RequestBody::Json(serde_json::json!({ "refresh_token": refresh_token.expose() })),
			upload_progress: None,
			download_progress: None,
		};
		let response = tokio::time::timeout(self.timeout, self.backend.execute(request))
			.await
			.map_err(|_| NormalizedError::timeout())??;

		if !response.is_success() {
			return Err(NormalizedError::from_status(response.status, &response.body));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let grant: TokenGrant =
			serde_path_to_error::deserialize(&mut deserializer).map_err(NormalizedError::decode)?;

		if grant.access_token.trim().is_empty() {
			return Err(NormalizedError::authentication(
				"Refresh response did not include an access token.",
			));
		}

		self.store.store(grant.into_update()).await?;

		Ok(self.store.snapshot().await?)
	}
}
