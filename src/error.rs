//! Client-level error types shared across requests, stores, and configuration.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Result type returned by every request issued through [`ApiClient`](crate::ApiClient).
pub type ApiResult<T> = std::result::Result<T, NormalizedError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by service and setup APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request failed after interception, retries, and refresh handling.
	#[error(transparent)]
	Api(#[from] NormalizedError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the request failure kind when the error came from the API layer.
	pub fn kind(&self) -> Option<ErrorKind> {
		match self {
			Self::Api(e) => Some(e.kind),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http(s).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A timeout was configured as zero.
	#[error("The {field} timeout must be greater than zero.")]
	ZeroTimeout {
		/// Which timeout failed validation.
		field: &'static str,
	},
	/// Retry budget must allow the initial attempt.
	#[error("max_retry_attempts must be at least 1.")]
	ZeroRetryAttempts,
	/// Backoff multiplier shrinks or is not a finite number.
	#[error("Backoff multiplier must be a finite number >= 1.0, got {multiplier}.")]
	InvalidMultiplier {
		/// Rejected multiplier.
		multiplier: f64,
	},
	/// Environment name is not recognized.
	#[error("Unknown environment `{name}`; expected development, staging, or production.")]
	UnknownEnvironment {
		/// Rejected name.
		name: String,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures reported by an [`HttpBackend`](crate::http::HttpBackend).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// No response arrived before the deadline.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS, IO).
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be built by the transport.
	#[error("Request could not be built.")]
	Request {
		/// Transport-specific builder error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific request construction error.
	pub fn request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Request { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else if e.is_builder() {
			Self::request(e)
		} else {
			Self::network(e)
		}
	}
}

/// Closed set of failure categories surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// No HTTP response (connection refused, DNS) or resource not found.
	Network,
	/// The request exceeded its deadline.
	Timeout,
	/// Credentials are missing, expired, or rejected.
	Authentication,
	/// The server rejected the payload.
	Validation,
	/// The server failed to process the request.
	Server,
	/// Anything the classification does not recognize.
	Unknown,
	/// The caller cancelled the request.
	Cancelled,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Network => "network",
			ErrorKind::Timeout => "timeout",
			ErrorKind::Authentication => "authentication",
			ErrorKind::Validation => "validation",
			ErrorKind::Server => "server",
			ErrorKind::Unknown => "unknown",
			ErrorKind::Cancelled => "cancelled",
		}
	}

	/// Maps an HTTP status code onto its failure kind.
	pub const fn from_status(status: u16) -> Self {
		match status {
			400 => ErrorKind::Validation,
			401 | 403 => ErrorKind::Authentication,
			404 => ErrorKind::Network,
			500 | 502 | 503 => ErrorKind::Server,
			_ => ErrorKind::Unknown,
		}
	}

	fn default_message(self) -> &'static str {
		match self {
			ErrorKind::Network => "Network request failed.",
			ErrorKind::Timeout => "Request timed out.",
			ErrorKind::Authentication => "Authentication failed.",
			ErrorKind::Validation => "Request was rejected by the server.",
			ErrorKind::Server => "Server error occurred.",
			ErrorKind::Unknown => "Unexpected error occurred.",
			ErrorKind::Cancelled => "Request was cancelled.",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// The single error shape every failed request resolves to.
///
/// Values are cheap to clone so a shared refresh outcome can be handed to every waiter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{message}")]
pub struct NormalizedError {
	/// Failure category.
	pub kind: ErrorKind,
	/// Human-readable message, preferring the server-supplied one.
	pub message: String,
	/// HTTP status, when a response was received.
	pub http_status: Option<u16>,
	/// Whether the failure class is transient.
	pub retryable: bool,
	/// Identifier of the logical request that failed.
	pub request_id: Option<String>,
}
impl NormalizedError {
	/// Creates an error of the given kind with the kind's default message.
	pub fn new(kind: ErrorKind) -> Self {
		Self {
			kind,
			message: kind.default_message().into(),
			http_status: None,
			retryable: false,
			request_id: None,
		}
	}

	/// Builds the error for an HTTP failure status, reading `message`/`error` from a JSON body.
	pub fn from_status(status: u16, body: &[u8]) -> Self {
		let kind = ErrorKind::from_status(status);
		let mut error = Self::new(kind);

		if let Some(message) = server_message(body) {
			error.message = message;
		}

		error.http_status = Some(status);
		error.retryable = crate::retry::is_retryable_status(Some(status));

		error
	}

	/// No HTTP response was received.
	pub fn network(detail: impl Display) -> Self {
		let mut error = Self::new(ErrorKind::Network);

		error.message = format!("Network request failed: {detail}.");
		error.retryable = true;

		error
	}

	/// The request exceeded its deadline.
	pub fn timeout() -> Self {
		Self::new(ErrorKind::Timeout)
	}

	/// The caller cancelled the request.
	pub fn cancelled() -> Self {
		Self::new(ErrorKind::Cancelled)
	}

	/// Credentials are missing or were rejected.
	pub fn authentication(message: impl Into<String>) -> Self {
		Self { message: message.into(), ..Self::new(ErrorKind::Authentication) }
	}

	/// A response body did not match the expected shape.
	pub fn decode(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = source.path().to_string();
		let inner = source.into_inner();

		Self {
			message: format!("Response body could not be decoded at `{path}`: {inner}."),
			..Self::new(ErrorKind::Unknown)
		}
	}

	/// Attaches the request identifier.
	pub fn with_request_id(mut self, request_id: Option<&str>) -> Self {
		if let Some(id) = request_id {
			self.request_id = Some(id.to_owned());
		}

		self
	}

	/// Attaches the HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}
}
impl From<TransportError> for NormalizedError {
	fn from(e: TransportError) -> Self {
		match e {
			TransportError::Timeout => Self::timeout(),
			TransportError::Network { source } => Self::network(source),
			TransportError::Request { source } =>
				Self { message: format!("Request could not be built: {source}."), ..Self::new(ErrorKind::Unknown) },
		}
	}
}
impl From<ConfigError> for NormalizedError {
	fn from(e: ConfigError) -> Self {
		Self { message: e.to_string(), ..Self::new(ErrorKind::Unknown) }
	}
}
impl From<crate::store::StoreError> for NormalizedError {
	fn from(e: crate::store::StoreError) -> Self {
		Self { message: e.to_string(), ..Self::new(ErrorKind::Unknown) }
	}
}

fn server_message(body: &[u8]) -> Option<String> {
	let value: Value = serde_json::from_slice(body).ok()?;

	["message", "error"]
		.into_iter()
		.filter_map(|field| value.get(field).and_then(Value::as_str))
		.map(str::trim)
		.find(|message| !message.is_empty())
		.map(ToOwned::to_owned)
}
