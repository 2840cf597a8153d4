//! Scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::Arc,
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use serde_json::Value;
// self
use photo_api_client::{
	ApiClient, ClientConfig, Environment,
	auth::CredentialUpdate,
	error::TransportError,
	http::{BackendFuture, HttpBackend, RawRequest, RawResponse},
	retry::RetryPolicy,
	store::{MemoryStore, TokenStore},
};

pub const BASE_URL: &str = "https://api.test/api";

/// What the backend does with one request.
pub enum Step {
	/// Reply immediately.
	Respond(RawResponse),
	/// Reply after a delay.
	RespondAfter(Duration, RawResponse),
	/// Fail without a response.
	Fail(TransportError),
	/// Never reply.
	Hang,
}
impl Step {
	pub fn json(status: u16, value: Value) -> Self {
		Self::Respond(RawResponse::json(status, &value))
	}

	pub fn status(status: u16) -> Self {
		Self::Respond(RawResponse::new(status, Vec::new()))
	}

	pub fn refused() -> Self {
		Self::Fail(TransportError::network(std::io::Error::new(
			std::io::ErrorKind::ConnectionRefused,
			"connection refused",
		)))
	}
}

type Handler = Box<dyn Fn(&RawRequest, usize) -> Step + Send + Sync>;

/// Backend answering through a closure that sees the request and the 0-based call index for its
/// path; every request is recorded.
pub struct ScriptedBackend {
	handler: Handler,
	requests: Mutex<Vec<RawRequest>>,
}
impl ScriptedBackend {
	pub fn new(handler: impl Fn(&RawRequest, usize) -> Step + Send + Sync + 'static) -> Arc<Self> {
		Arc::new(Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) })
	}

	pub fn requests(&self) -> Vec<RawRequest> {
		self.requests.lock().clone()
	}

	pub fn calls(&self, path: &str) -> usize {
		self.requests.lock().iter().filter(|r| r.url.path().ends_with(path)).count()
	}

	pub fn requests_to(&self, path: &str) -> Vec<RawRequest> {
		self.requests.lock().iter().filter(|r| r.url.path().ends_with(path)).cloned().collect()
	}
}
impl HttpBackend for ScriptedBackend {
	fn execute(&self, request: RawRequest) -> BackendFuture<'_> {
		let index = {
			let mut requests = self.requests.lock();
			let index = requests.iter().filter(|r| r.url.path() == request.url.path()).count();

			requests.push(request.clone());

			index
		};
		let step = (self.handler)(&request, index);

		Box::pin(async move {
			match step {
				Step::Respond(response) => Ok(response),
				Step::RespondAfter(delay, response) => {
					tokio::time::sleep(delay).await;

					Ok(response)
				},
				Step::Fail(error) => Err(error),
				Step::Hang => std::future::pending().await,
			}
		})
	}
}

pub fn config(retry: RetryPolicy) -> ClientConfig {
	ClientConfig::builder(Environment::Development)
		.base_url(BASE_URL)
		.timeout(Duration::from_secs(5))
		.retry_policy(retry)
		.build()
		.expect("Test configuration should validate.")
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy::new(max_attempts).with_base_delay(Duration::from_millis(1))
}

pub fn memory_store() -> (TokenStore, MemoryStore) {
	let memory = MemoryStore::default();

	(TokenStore::new(Arc::new(memory.clone())), memory)
}

pub fn client(backend: Arc<ScriptedBackend>, retry: RetryPolicy) -> (ApiClient, TokenStore) {
	let (store, _) = memory_store();
	let client = ApiClient::with_backend(&config(retry), store.clone(), backend);

	(client, store)
}

pub async fn sign_in(store: &TokenStore, access: &str, refresh: Option<&str>) {
	let mut update = CredentialUpdate::new().access_token(access).expires_in(Duration::from_secs(3600));

	if let Some(refresh) = refresh {
		update = update.refresh_token(refresh);
	}

	store.store(update).await.expect("Seeding the credential should succeed.");
}

pub fn bearer(request: &RawRequest) -> Option<String> {
	request.header("authorization").map(ToOwned::to_owned)
}
