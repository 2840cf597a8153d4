//! Transport primitives for API calls.
//!
//! [`HttpBackend`] is the client's only dependency on an HTTP stack. The client hands it a fully
//! prepared [`RawRequest`] (absolute URL, merged headers, body, optional progress reporters) and
//! receives either a [`RawResponse`] with any status code or a [`TransportError`] when no response
//! arrived. Status interpretation, retries, and refreshes all happen above this layer, so a
//! backend must never retry on its own.

pub mod multipart;
pub mod progress;

pub use multipart::*;
pub use progress::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use futures_util::StreamExt;
#[cfg(feature = "reqwest")] use reqwest::{
	Body as ReqwestBody,
	header::HeaderMap,
	multipart::{Form as ReqwestForm, Part as ReqwestPart},
};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpBackend::execute`].
pub type BackendFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Executes prepared requests against the network.
///
/// Implementations must be `Send + Sync + 'static` so a single backend can be shared by the
/// client and the in-flight refresh exchange.
pub trait HttpBackend
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` once and resolves with whatever response the server produced.
	fn execute(&self, request: RawRequest) -> BackendFuture<'_>;
}

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the verb as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Request payload variants.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(Value),
	/// `multipart/form-data` upload.
	Multipart(MultipartForm),
}
impl RequestBody {
	/// Returns `true` for multipart payloads.
	pub fn is_multipart(&self) -> bool {
		matches!(self, Self::Multipart(_))
	}
}

/// Fully prepared request handed to a backend.
#[derive(Clone, Debug)]
pub struct RawRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Header map with lower-case names.
	pub headers: BTreeMap<String, String>,
	/// Payload.
	pub body: RequestBody,
	/// Receives upload progress for multipart bodies.
	pub upload_progress: Option<ProgressReporter>,
	/// Receives download progress while the response body streams in.
	pub download_progress: Option<ProgressReporter>,
}
impl RawRequest {
	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&header_key(name)).map(String::as_str)
	}
}

/// Response as received from the server, before any status interpretation.
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header map with lower-case names.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response with the given status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Creates a JSON response.
	pub fn json(status: u16, value: &Value) -> Self {
		let mut response = Self::new(status, value.to_string());

		response.headers.insert("content-type".into(), "application/json".into());

		response
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Normalizes a header name so lookups and merges are case-insensitive.
pub fn header_key(name: &str) -> String {
	name.trim().to_ascii_lowercase()
}

/// Default backend built on [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestBackend(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestBackend {
	const UPLOAD_CHUNK: usize = 64 * 1024;

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build_form(
		form: MultipartForm,
		progress: Option<ProgressReporter>,
	) -> Result<ReqwestForm, TransportError> {
		let total = form.file_bytes();
		let mut out = ReqwestForm::new();
		let mut offset = 0;

		for (name, value) in form.fields {
			out = out.text(name, value);
		}
		if let Some(progress) = &progress {
			progress.report(0, Some(total));
		}

		for file in form.files {
			let len = file.len();
			let body = Self::progress_body(file.data, offset, total, progress.clone());
			let part = ReqwestPart::stream_with_length(body, len)
				.file_name(file.file_name)
				.mime_str(&file.mime_type)
				.map_err(TransportError::request)?;

			out = out.part(file.field, part);
			offset += len;
		}

		Ok(out)
	}

	fn progress_body(
		data: Arc<[u8]>,
		offset: u64,
		total: u64,
		progress: Option<ProgressReporter>,
	) -> ReqwestBody {
		let Some(progress) = progress else {
			return ReqwestBody::from(data.to_vec());
		};
		let chunks = data.chunks(Self::UPLOAD_CHUNK).map(<[u8]>::to_vec).collect::<Vec<_>>();
		let mut sent = offset;
		let stream = futures_util::stream::iter(chunks).map(move |chunk| {
			sent += chunk.len() as u64;
			progress.report(sent, Some(total));

			Ok::<_, std::io::Error>(chunk)
		});

		ReqwestBody::wrap_stream(stream)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestBackend {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestBackend {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpBackend for ReqwestBackend {
	fn execute(&self, request: RawRequest) -> BackendFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let RawRequest { method, url, headers, body, upload_progress, download_progress } =
				request;
			let mut builder = client.request(method.into(), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			builder = match body {
				RequestBody::Empty => builder,
				RequestBody::Json(value) =>
					builder.body(serde_json::to_vec(&value).map_err(TransportError::request)?),
				RequestBody::Multipart(form) =>
					builder.multipart(Self::build_form(form, upload_progress)?),
			};

			let mut response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let total = response.content_length();
			let mut body = Vec::with_capacity(
				total.and_then(|len| usize::try_from(len).ok()).unwrap_or_default(),
			);

			if let Some(progress) = &download_progress {
				progress.report(0, total);
			}

			while let Some(chunk) = response.chunk().await? {
				body.extend_from_slice(&chunk);

				if let Some(progress) = &download_progress {
					progress.report(body.len() as u64, total);
				}
			}

			Ok(RawResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
	headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect()
}
