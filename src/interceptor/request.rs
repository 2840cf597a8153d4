//! Per-attempt request preparation.

// std
use std::time::{Instant, SystemTime, UNIX_EPOCH};
// self
use crate::{
	_prelude::*,
	auth::RequestSigner,
	client::ClientSettings,
	error::ConfigError,
	http::{Method, ProgressReporter, RawRequest, RequestBody, header_key},
	obs::{self, CallKind},
};

/// Bookkeeping carried across the attempts of one logical request.
#[derive(Clone, Debug, Default)]
pub struct RequestMetadata {
	/// When the current attempt was prepared.
	pub start_time: Option<Instant>,
	/// Identifier minted on the first attempt and kept across retries.
	pub request_id: Option<String>,
	/// 1-based attempt counter; only backoff retries advance it.
	pub retry_attempt: u32,
	/// Set once the request went through its single refresh-and-retry.
	pub auth_retried: bool,
	/// Refresh generation observed before the current attempt read its token.
	pub refresh_generation: u64,
}

/// Everything needed to issue one logical request, retries included.
#[derive(Clone, Debug)]
pub struct RequestContext {
	/// Call category used for timeouts and observability.
	pub kind: CallKind,
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the base URL, or an absolute URL.
	pub path: String,
	/// Query parameters appended to the URL.
	pub query: Vec<(String, String)>,
	/// Caller-supplied headers; they win over defaults.
	pub headers: BTreeMap<String, String>,
	/// Payload.
	pub body: RequestBody,
	/// Per-attempt timeout override.
	pub timeout: Option<Duration>,
	/// Transfer progress sink.
	pub progress: Option<ProgressReporter>,
	/// Attempt bookkeeping.
	pub metadata: RequestMetadata,
}
impl RequestContext {
	/// Creates a context for the first attempt.
	pub fn new(kind: CallKind, method: Method, path: impl Into<String>, body: RequestBody) -> Self {
		Self {
			kind,
			method,
			path: path.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body,
			timeout: None,
			progress: None,
			metadata: RequestMetadata { retry_attempt: 1, ..Default::default() },
		}
	}

	/// Identifier of the logical request, once minted.
	pub fn request_id(&self) -> Option<&str> {
		self.metadata.request_id.as_deref()
	}
}

/// Signs, stamps, and merges headers for each attempt.
#[derive(Clone, Debug)]
pub struct RequestInterceptor {
	signer: RequestSigner,
}
impl RequestInterceptor {
	/// Creates an interceptor that signs with `signer`.
	pub fn new(signer: RequestSigner) -> Self {
		Self { signer }
	}

	/// Turns the context into a sendable request for the next attempt.
	///
	/// `refresh_generation` must be read before this call so a later `401` can tell whether the
	/// token it carried was already replaced.
	pub async fn prepare(
		&self,
		ctx: &mut RequestContext,
		settings: &ClientSettings,
		refresh_generation: u64,
	) -> Result<RawRequest, NormalizedError> {
		ctx.metadata.refresh_generation = refresh_generation;

		let authorization = match self.signer.authorization_header().await {
			Ok(header) => header,
			Err(e) => {
				obs::storage_failure("authorization_header", &e);

				None
			},
		};

		ctx.metadata.start_time = Some(Instant::now());
		ctx.metadata.request_id.get_or_insert_with(mint_request_id);

		let mut headers = settings
			.default_headers
			.iter()
			.map(|(name, value)| (header_key(name), value.clone()))
			.collect::<BTreeMap<_, _>>();

		if let Some(value) = authorization {
			headers.insert("authorization".into(), value);
		}

		headers.extend(ctx.headers.iter().map(|(name, value)| (header_key(name), value.clone())));

		if ctx.body.is_multipart() {
			headers.remove("content-type");
		}

		let url = resolve_url(&settings.base_url, &ctx.path, &ctx.query)?;
		let (upload_progress, download_progress) = match ctx.kind {
			CallKind::Upload => (ctx.progress.clone(), None),
			CallKind::Download => (None, ctx.progress.clone()),
			CallKind::Json | CallKind::Refresh => (None, None),
		};

		Ok(RawRequest {
			method: ctx.method,
			url,
			headers,
			body: ctx.body.clone(),
			upload_progress,
			download_progress,
		})
	}
}

/// Joins `path` onto `base`; absolute http(s) URLs are used as they are.
pub fn resolve_url(
	base: &Url,
	path: &str,
	query: &[(String, String)],
) -> Result<Url, ConfigError> {
	let mut url = match Url::parse(path) {
		Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => absolute,
		_ => {
			let joined = format!(
				"{}/{}",
				base.as_str().trim_end_matches('/'),
				path.trim_start_matches('/')
			);

			Url::parse(&joined)
				.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })?
		},
	};

	if !query.is_empty() {
		url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
	}

	Ok(url)
}

fn mint_request_id() -> String {
	let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);

	format!("req_{millis}_{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::{MemoryStore, TokenStore};

	fn settings() -> ClientSettings {
		let mut default_headers = BTreeMap::new();

		default_headers.insert("Content-Type".to_owned(), "application/json".to_owned());
		default_headers.insert("Accept".to_owned(), "application/json".to_owned());

		ClientSettings {
			base_url: Url::parse("https://api.example.com/api/").expect("Fixture URL should parse."),
			default_headers,
			timeout: Duration::from_secs(10),
			transfer_timeout: Duration::from_secs(60),
		}
	}

	fn interceptor() -> (RequestInterceptor, TokenStore) {
		let store = TokenStore::new(Arc::new(MemoryStore::default()));

		(RequestInterceptor::new(RequestSigner::new(store.clone())), store)
	}

	#[test]
	fn urls_join_without_duplicate_slashes() {
		let base = Url::parse("https://api.example.com/api/").expect("Fixture URL should parse.");
		let url = resolve_url(&base, "/groups/search", &[("q".into(), "beach trip".into())])
			.expect("Path should resolve.");

		assert_eq!(url.as_str(), "https://api.example.com/api/groups/search?q=beach+trip");

		let absolute = resolve_url(&base, "https://cdn.example.com/p/1.jpg", &[])
			.expect("Absolute URL should pass through.");

		assert_eq!(absolute.as_str(), "https://cdn.example.com/p/1.jpg");
	}

	#[tokio::test]
	async fn request_id_is_stable_across_attempts() {
		let (interceptor, _) = interceptor();
		let mut ctx = RequestContext::new(CallKind::Json, Method::Get, "/groups", RequestBody::Empty);
		let settings = settings();

		interceptor.prepare(&mut ctx, &settings, 0).await.expect("First attempt should prepare.");

		let first = ctx.request_id().map(ToOwned::to_owned).expect("Request id should be minted.");

		interceptor.prepare(&mut ctx, &settings, 0).await.expect("Retry should prepare.");

		assert!(first.starts_with("req_"));
		assert_eq!(ctx.request_id(), Some(first.as_str()));
	}

	#[tokio::test]
	async fn caller_headers_win_and_multipart_drops_content_type() {
		let (interceptor, store) = interceptor();

		store
			.store(crate::auth::CredentialUpdate::new().access_token("abc"))
			.await
			.expect("Token should store.");

		let mut ctx = RequestContext::new(
			CallKind::Upload,
			Method::Post,
			"photos/upload",
			RequestBody::Multipart(Default::default()),
		);

		ctx.headers.insert("ACCEPT".into(), "image/*".into());

		let request =
			interceptor.prepare(&mut ctx, &settings(), 3).await.expect("Request should prepare.");

		assert_eq!(request.header("authorization"), Some("Bearer abc"));
		assert_eq!(request.header("accept"), Some("image/*"));
		assert_eq!(request.header("content-type"), None);
		assert_eq!(ctx.metadata.refresh_generation, 3);
	}
}
