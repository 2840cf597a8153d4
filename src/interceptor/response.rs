//! Response classification as an explicit state machine.
//!
//! Each attempt ends in one [`ResponseState`]. `AuthRetry` and `BackoffRetry` loop back into the
//! request interceptor, `Success` and `TerminalFailure` leave the loop. Transport timeouts and
//! missing responses are classified before a status is ever looked at.

// crates.io
use futures_util::future::{BoxFuture, FutureExt};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::{ApiClient, ApiResponse, CancelHandle},
	endpoints,
	error::TransportError,
	http::RawResponse,
	interceptor::{RequestContext, resolve_url},
	obs::{self, CallOutcome, CallSpan},
	refresh::RefreshExchange,
};

/// Next step after an attempt settles.
#[derive(Debug)]
pub enum ResponseState {
	/// 2xx response; the loop ends.
	Success(RawResponse),
	/// A refresh succeeded; resend once without consuming retry budget.
	AuthRetry,
	/// Transient failure; wait and try again.
	BackoffRetry(Duration),
	/// Final error for the caller.
	TerminalFailure(NormalizedError),
}

/// Raw result of one attempt: `None` when the attempt timed out.
pub type AttemptResult = Option<Result<RawResponse, TransportError>>;

impl ApiClient {
	pub(crate) async fn dispatch(
		&self,
		mut ctx: RequestContext,
		cancel: Option<&CancelHandle>,
	) -> Result<ApiResponse, NormalizedError> {
		let span = CallSpan::new(ctx.kind, ctx.method, &ctx.path);
		let kind = ctx.kind;

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span.instrument(self.attempt_loop(&mut ctx, cancel)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
		}

		result.map_err(|e| e.with_request_id(ctx.request_id()))
	}

	async fn attempt_loop(
		&self,
		ctx: &mut RequestContext,
		cancel: Option<&CancelHandle>,
	) -> Result<ApiResponse, NormalizedError> {
		loop {
			let settings = self.settings();
			let generation = self.refresh.generation();
			let request = self.interceptor.prepare(ctx, &settings, generation).await?;
			let timeout = ctx.timeout.unwrap_or_else(|| settings.timeout_for(ctx.kind));
			let attempt = tokio::time::timeout(timeout, self.backend.execute(request));
			let outcome = CancelHandle::guard(cancel, attempt).await?.ok();

			match self.classify(ctx, outcome, cancel).await {
				ResponseState::Success(response) => {
					let duration =
						ctx.metadata.start_time.map(|start| start.elapsed()).unwrap_or_default();

					obs::record_call_duration(ctx.kind, duration);

					return Ok(ApiResponse {
						status: response.status,
						headers: response.headers,
						body: response.body,
						request_id: ctx.request_id().unwrap_or_default().to_owned(),
						duration,
					});
				},
				ResponseState::AuthRetry => continue,
				ResponseState::BackoffRetry(delay) => {
					obs::record_call_outcome(ctx.kind, CallOutcome::Retry);
					CancelHandle::guard(cancel, tokio::time::sleep(delay)).await?;
				},
				ResponseState::TerminalFailure(error) => return Err(error),
			}
		}
	}

	/// Maps the outcome of one attempt onto the next state, mutating the attempt bookkeeping.
	pub async fn classify(
		&self,
		ctx: &mut RequestContext,
		outcome: AttemptResult,
		cancel: Option<&CancelHandle>,
	) -> ResponseState {
		let response = match outcome {
			None | Some(Err(TransportError::Timeout)) =>
				return ResponseState::TerminalFailure(NormalizedError::timeout()),
			Some(Err(e)) => return self.backoff_or_fail(ctx, NormalizedError::from(e)),
			Some(Ok(response)) => response,
		};

		if response.is_success() {
			return ResponseState::Success(response);
		}

		let error = NormalizedError::from_status(response.status, &response.body);

		if response.status == 401 {
			return self.on_unauthorized(ctx, error, cancel).await;
		}

		self.backoff_or_fail(ctx, error)
	}

	async fn on_unauthorized(
		&self,
		ctx: &mut RequestContext,
		error: NormalizedError,
		cancel: Option<&CancelHandle>,
	) -> ResponseState {
		if ctx.metadata.auth_retried {
			self.clear_session("auth_retry_rejected").await;

			return ResponseState::TerminalFailure(error);
		}

		ctx.metadata.auth_retried = true;

		let refreshed = self.refresh.refresh(ctx.metadata.refresh_generation, || self.exchange());

		match CancelHandle::guard(cancel, refreshed).await {
			Ok(Ok(_)) => ResponseState::AuthRetry,
			// The shared exchange already cleared the session.
			Ok(Err(_)) => ResponseState::TerminalFailure(error),
			Err(cancelled) => ResponseState::TerminalFailure(cancelled),
		}
	}

	fn backoff_or_fail(&self, ctx: &mut RequestContext, error: NormalizedError) -> ResponseState {
		let attempt = ctx.metadata.retry_attempt;

		if !self.retry.should_retry(&error, attempt) {
			return ResponseState::TerminalFailure(error);
		}

		let delay = self.retry.compute_delay(attempt);

		obs::retry_scheduled(ctx.request_id().unwrap_or_default(), attempt, delay, &error);
		obs::record_retry_delay(ctx.kind, delay);

		ctx.metadata.retry_attempt += 1;

		ResponseState::BackoffRetry(delay)
	}

	fn exchange(&self) -> BoxFuture<'static, Result<Credential, NormalizedError>> {
		let settings = self.settings();
		let backend = Arc::clone(&self.backend);
		let store = self.store.clone();
		let url = resolve_url(&settings.base_url, endpoints::auth::REFRESH, &[]);
		let timeout = settings.timeout;
		let headers = settings.default_headers;

		async move { RefreshExchange { backend, store, url: url?, headers, timeout }.run().await }
			.boxed()
	}

	async fn clear_session(&self, reason: &'static str) {
		// Per-key failures are already logged by the store.
		let _ = self.store.clear_all().await;

		obs::session_cleared(reason);
		obs::record_session_cleared(reason);
	}
}
