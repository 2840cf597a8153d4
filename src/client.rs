//! HTTP transport facade with interception, refresh, and retries.
//!
//! [`ApiClient`] owns the backend, the credential store, the refresh gate, and the mutable
//! transport settings (base URL, default headers, timeouts). Every verb helper funnels into one
//! attempt loop driven by the response state machine in
//! [`interceptor::response`](crate::interceptor::response).

pub mod options;

pub use options::*;

// self
use crate::{
	_prelude::*,
	auth::RequestSigner,
	config::ClientConfig,
	error::ApiResult,
	http::{HttpBackend, Method, MultipartForm, RequestBody},
	interceptor::{RequestContext, RequestInterceptor},
	obs::CallKind,
	refresh::SingleFlightRefresh,
	retry::RetryPolicy,
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestBackend};

/// Transport settings that can change while the client is alive.
#[derive(Clone, Debug)]
pub struct ClientSettings {
	/// Base URL that relative paths are joined onto.
	pub base_url: Url,
	/// Headers applied to every request unless the caller overrides them.
	pub default_headers: BTreeMap<String, String>,
	/// Per-attempt timeout for JSON calls.
	pub timeout: Duration,
	/// Per-attempt timeout for uploads and downloads.
	pub transfer_timeout: Duration,
}
impl ClientSettings {
	/// Headers every client starts with.
	pub fn json_headers() -> BTreeMap<String, String> {
		BTreeMap::from([
			("accept".to_owned(), "application/json".to_owned()),
			("content-type".to_owned(), "application/json".to_owned()),
		])
	}

	pub(crate) fn timeout_for(&self, kind: CallKind) -> Duration {
		match kind {
			CallKind::Upload | CallKind::Download => self.transfer_timeout,
			CallKind::Json | CallKind::Refresh => self.timeout,
		}
	}
}

/// Successful response with its request bookkeeping.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: u16,
	/// Response headers with lower-case names.
	pub headers: BTreeMap<String, String>,
	/// Raw body.
	pub body: Vec<u8>,
	/// Identifier shared by every attempt of the request.
	pub request_id: String,
	/// Wall time of the successful attempt.
	pub duration: Duration,
}
impl ApiResponse {
	/// Decodes the body as JSON; an empty body decodes as `null`.
	pub fn json<T>(&self) -> ApiResult<T>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &self.body };
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| NormalizedError::decode(e).with_request_id(Some(&self.request_id)))
	}
}

/// Resilient API client; clones share every piece of state.
#[derive(Clone)]
pub struct ApiClient {
	pub(crate) backend: Arc<dyn HttpBackend>,
	pub(crate) store: TokenStore,
	pub(crate) interceptor: RequestInterceptor,
	pub(crate) settings: Arc<RwLock<ClientSettings>>,
	pub(crate) retry: RetryPolicy,
	pub(crate) refresh: SingleFlightRefresh,
}
impl ApiClient {
	/// Builds a client on the default reqwest backend.
	#[cfg(feature = "reqwest")]
	pub fn new(config: &ClientConfig, store: TokenStore) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self::with_backend(config, store, Arc::new(ReqwestBackend::with_client(client))))
	}

	/// Builds a client on a caller-provided backend.
	pub fn with_backend(
		config: &ClientConfig,
		store: TokenStore,
		backend: Arc<dyn HttpBackend>,
	) -> Self {
		let settings = ClientSettings {
			base_url: config.base_url.clone(),
			default_headers: ClientSettings::json_headers(),
			timeout: config.timeout,
			transfer_timeout: config.transfer_timeout,
		};

		Self {
			backend,
			interceptor: RequestInterceptor::new(RequestSigner::new(store.clone())),
			store,
			settings: Arc::new(RwLock::new(settings)),
			retry: config.retry,
			refresh: SingleFlightRefresh::new(),
		}
	}

	/// Credential store used for signing and refresh.
	pub fn token_store(&self) -> &TokenStore {
		&self.store
	}

	/// Refresh gate shared by every clone of this client.
	pub fn refresh_gate(&self) -> &SingleFlightRefresh {
		&self.refresh
	}

	/// Retry policy applied to every call.
	pub fn retry_policy(&self) -> &RetryPolicy {
		&self.retry
	}

	/// Snapshot of the current transport settings.
	pub fn settings(&self) -> ClientSettings {
		self.settings.read().clone()
	}

	/// Points subsequent calls at a new base URL.
	pub fn update_base_url(&self, base_url: Url) {
		self.settings.write().base_url = base_url;
	}

	/// Replaces the default headers for subsequent calls.
	pub fn set_default_headers<I, K, V>(&self, headers: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		self.settings.write().default_headers = headers
			.into_iter()
			.map(|(name, value)| (crate::http::header_key(name.as_ref()), value.into()))
			.collect();
	}

	/// `GET` returning the decoded body.
	pub async fn get<T>(&self, path: &str, options: RequestOptions) -> ApiResult<T>
	where
		T: DeserializeOwned,
	{
		self.send(Method::Get, path, RequestBody::Empty, options).await?.json()
	}

	/// `POST` with a JSON body.
	pub async fn post<T, P>(&self, path: &str, payload: &P, options: RequestOptions) -> ApiResult<T>
	where
		T: DeserializeOwned,
		P: ?Sized + Serialize,
	{
		self.send(Method::Post, path, json_body(payload)?, options).await?.json()
	}

	/// `PUT` with a JSON body.
	pub async fn put<T, P>(&self, path: &str, payload: &P, options: RequestOptions) -> ApiResult<T>
	where
		T: DeserializeOwned,
		P: ?Sized + Serialize,
	{
		self.send(Method::Put, path, json_body(payload)?, options).await?.json()
	}

	/// `PATCH` with a JSON body.
	pub async fn patch<T, P>(&self, path: &str, payload: &P, options: RequestOptions) -> ApiResult<T>
	where
		T: DeserializeOwned,
		P: ?Sized + Serialize,
	{
		self.send(Method::Patch, path, json_body(payload)?, options).await?.json()
	}

	/// `DELETE` returning the decoded body.
	pub async fn delete<T>(&self, path: &str, options: RequestOptions) -> ApiResult<T>
	where
		T: DeserializeOwned,
	{
		self.send(Method::Delete, path, RequestBody::Empty, options).await?.json()
	}

	/// `POST` of a multipart form; progress is measured against the file bytes.
	pub async fn upload_multipart<T>(
		&self,
		path: &str,
		form: MultipartForm,
		options: RequestOptions,
	) -> ApiResult<T>
	where
		T: DeserializeOwned,
	{
		self.send(Method::Post, path, RequestBody::Multipart(form), options).await?.json()
	}

	/// `GET` returning the raw body bytes.
	pub async fn download_binary(&self, path: &str, options: RequestOptions) -> ApiResult<Vec<u8>> {
		let (ctx, cancel) =
			Self::context(CallKind::Download, Method::Get, path, RequestBody::Empty, options);

		Ok(self.dispatch(ctx, cancel.as_ref()).await?.body)
	}

	/// Issues a request and returns the full response.
	pub async fn send(
		&self,
		method: Method,
		path: &str,
		body: RequestBody,
		options: RequestOptions,
	) -> ApiResult<ApiResponse> {
		let kind = if body.is_multipart() { CallKind::Upload } else { CallKind::Json };
		let (ctx, cancel) = Self::context(kind, method, path, body, options);

		self.dispatch(ctx, cancel.as_ref()).await
	}

	fn context(
		kind: CallKind,
		method: Method,
		path: &str,
		body: RequestBody,
		options: RequestOptions,
	) -> (RequestContext, Option<CancelHandle>) {
		let RequestOptions { headers, query, cancel, progress, timeout } = options;
		let mut ctx = RequestContext::new(kind, method, path, body);

		ctx.headers = headers;
		ctx.query = query;
		ctx.progress = progress;
		ctx.timeout = timeout;

		(ctx, cancel)
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("settings", &*self.settings.read())
			.field("retry", &self.retry)
			.field("refresh", &self.refresh)
			.finish_non_exhaustive()
	}
}

fn json_body<P>(payload: &P) -> ApiResult<RequestBody>
where
	P: ?Sized + Serialize,
{
	serde_json::to_value(payload).map(RequestBody::Json).map_err(|e| NormalizedError {
		message: format!("Request body could not be serialized: {e}."),
		..NormalizedError::new(ErrorKind::Validation)
	})
}
