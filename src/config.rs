//! Environment selection and validated client configuration.

// self
use crate::{_prelude::*, error::ConfigError, retry::RetryPolicy};

/// Named deployment targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Local backend.
	#[default]
	Development,
	/// Pre-release backend.
	Staging,
	/// Live backend.
	Production,
}
impl Environment {
	/// Process environment variable consulted by [`Environment::from_env`].
	pub const ENV_VAR: &str = "PHOTO_API_ENV";

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Development => "development",
			Environment::Staging => "staging",
			Environment::Production => "production",
		}
	}

	/// Reads [`Environment::ENV_VAR`]; unset or blank selects development.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_optional(std::env::var(Self::ENV_VAR).ok().as_deref())
	}

	/// Parses an optional raw value the way [`Environment::from_env`] does.
	pub fn from_optional(raw: Option<&str>) -> Result<Self, ConfigError> {
		match raw.map(str::trim) {
			None | Some("") => Ok(Self::default()),
			Some(raw) => raw.parse(),
		}
	}

	/// Base URL used when nothing overrides it.
	pub const fn default_base_url(self) -> &'static str {
		match self {
			Environment::Development => "http://localhost:3000/api",
			Environment::Staging => "https://staging-api.photoshare.app/api",
			Environment::Production => "https://api.photoshare.app/api",
		}
	}

	/// Per-attempt timeout for JSON calls.
	pub const fn default_timeout(self) -> Duration {
		match self {
			Environment::Development => Duration::from_secs(10),
			Environment::Staging => Duration::from_secs(15),
			Environment::Production => Duration::from_secs(30),
		}
	}

	/// Per-attempt timeout for uploads and downloads.
	pub const fn default_transfer_timeout(self) -> Duration {
		match self {
			Environment::Development => Duration::from_secs(60),
			Environment::Staging | Environment::Production => Duration::from_secs(120),
		}
	}

	/// Attempt budget, the initial request included.
	pub const fn default_max_retry_attempts(self) -> u32 {
		match self {
			Environment::Development => 2,
			Environment::Staging | Environment::Production => RetryPolicy::DEFAULT_MAX_ATTEMPTS,
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Environment {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"staging" | "stage" => Ok(Self::Staging),
			"production" | "prod" => Ok(Self::Production),
			_ => Err(ConfigError::UnknownEnvironment { name: s.to_owned() }),
		}
	}
}

/// Validated settings a client is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
	/// Selected environment.
	pub environment: Environment,
	/// Base URL relative paths are joined onto.
	pub base_url: Url,
	/// Per-attempt timeout for JSON calls.
	pub timeout: Duration,
	/// Per-attempt timeout for uploads and downloads.
	pub transfer_timeout: Duration,
	/// Backoff policy.
	pub retry: RetryPolicy,
}
impl ClientConfig {
	/// Starts a builder seeded with the environment defaults.
	pub fn builder(environment: Environment) -> ClientConfigBuilder {
		ClientConfigBuilder::new(environment)
	}

	/// Default configuration for `environment`.
	pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
		Self::builder(environment).build()
	}

	/// Default configuration for the environment named by [`Environment::ENV_VAR`].
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::for_environment(Environment::from_env()?)
	}

	/// Parses a JSON document such as
	/// `{"environment":"staging","timeout_ms":5000,"max_retry_attempts":4}`.
	///
	/// Fields other than `environment` are optional overrides.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(raw);
		let document: ConfigDocument = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::Parse { source })?;

		document.into_builder().build()
	}

	/// Attempt budget of the retry policy.
	pub fn max_retry_attempts(&self) -> u32 {
		self.retry.max_attempts
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	environment: Environment,
	base_url: Option<String>,
	timeout: Option<Duration>,
	transfer_timeout: Option<Duration>,
	retry: RetryPolicy,
}
impl ClientConfigBuilder {
	fn new(environment: Environment) -> Self {
		Self {
			environment,
			base_url: None,
			timeout: None,
			transfer_timeout: None,
			retry: RetryPolicy::new(environment.default_max_retry_attempts()),
		}
	}

	/// Overrides the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Overrides the JSON call timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the upload/download timeout.
	pub fn transfer_timeout(mut self, timeout: Duration) -> Self {
		self.transfer_timeout = Some(timeout);

		self
	}

	/// Overrides the attempt budget.
	pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
		self.retry.max_attempts = attempts;

		self
	}

	/// Replaces the whole retry policy.
	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry = policy;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let raw = self.base_url.unwrap_or_else(|| self.environment.default_base_url().to_owned());
		let base_url = Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: raw.clone(), source })?;
		let config = ClientConfig {
			environment: self.environment,
			base_url,
			timeout: self.timeout.unwrap_or_else(|| self.environment.default_timeout()),
			transfer_timeout: self
				.transfer_timeout
				.unwrap_or_else(|| self.environment.default_transfer_timeout()),
			retry: self.retry,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { field: "request" });
		}
		if self.transfer_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { field: "transfer" });
		}
		if self.retry.max_attempts == 0 {
			return Err(ConfigError::ZeroRetryAttempts);
		}
		if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
			return Err(ConfigError::InvalidMultiplier { multiplier: self.retry.multiplier });
		}

		Ok(())
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
	environment: Environment,
	#[serde(default)]
	base_url: Option<String>,
	#[serde(default)]
	timeout_ms: Option<u64>,
	#[serde(default)]
	transfer_timeout_ms: Option<u64>,
	#[serde(default)]
	max_retry_attempts: Option<u32>,
	#[serde(default)]
	retry_base_delay_ms: Option<u64>,
	#[serde(default)]
	retry_multiplier: Option<f64>,
	#[serde(default)]
	retry_max_delay_ms: Option<u64>,
}
impl ConfigDocument {
	fn into_builder(self) -> ClientConfigBuilder {
		let mut builder = ClientConfig::builder(self.environment);

		if let Some(url) = self.base_url {
			builder = builder.base_url(url);
		}
		if let Some(ms) = self.timeout_ms {
			builder = builder.timeout(Duration::from_millis(ms));
		}
		if let Some(ms) = self.transfer_timeout_ms {
			builder = builder.transfer_timeout(Duration::from_millis(ms));
		}
		if let Some(attempts) = self.max_retry_attempts {
			builder = builder.max_retry_attempts(attempts);
		}
		if let Some(ms) = self.retry_base_delay_ms {
			builder.retry = builder.retry.with_base_delay(Duration::from_millis(ms));
		}
		if let Some(multiplier) = self.retry_multiplier {
			builder.retry = builder.retry.with_multiplier(multiplier);
		}
		if let Some(ms) = self.retry_max_delay_ms {
			builder.retry = builder.retry.with_max_delay(Duration::from_millis(ms));
		}

		builder
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn environment_names_parse_case_insensitively() {
		assert_eq!("Production".parse::<Environment>().ok(), Some(Environment::Production));
		assert_eq!("dev".parse::<Environment>().ok(), Some(Environment::Development));
		assert_eq!(Environment::from_optional(None).ok(), Some(Environment::Development));
		assert_eq!(Environment::from_optional(Some("  ")).ok(), Some(Environment::Development));
		assert!(matches!(
			Environment::from_optional(Some("qa")),
			Err(ConfigError::UnknownEnvironment { name }) if name == "qa"
		));
	}

	#[test]
	fn defaults_validate_for_every_environment() {
		for env in [Environment::Development, Environment::Staging, Environment::Production] {
			let config = ClientConfig::for_environment(env).expect("Defaults should validate.");

			assert_eq!(config.environment, env);
			assert!(config.max_retry_attempts() >= 1);
		}
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let env = Environment::Staging;

		assert!(matches!(
			ClientConfig::builder(env).base_url("ftp://files.example.com").build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(
			ClientConfig::builder(env).base_url("not a url").build(),
			Err(ConfigError::InvalidBaseUrl { .. })
		));
		assert!(matches!(
			ClientConfig::builder(env).timeout(Duration::ZERO).build(),
			Err(ConfigError::ZeroTimeout { field: "request" })
		));
		assert!(matches!(
			ClientConfig::builder(env).max_retry_attempts(0).build(),
			Err(ConfigError::ZeroRetryAttempts)
		));
		assert!(matches!(
			ClientConfig::builder(env).retry_policy(RetryPolicy::new(3).with_multiplier(0.5)).build(),
			Err(ConfigError::InvalidMultiplier { .. })
		));
	}

	#[test]
	fn json_document_applies_overrides() {
		let config = ClientConfig::from_json(
			r#"{"environment":"production","base_url":"https://eu.api.photoshare.app/api","timeout_ms":5000,"max_retry_attempts":5,"retry_base_delay_ms":250}"#,
		)
		.expect("Document should parse.");

		assert_eq!(config.environment, Environment::Production);
		assert_eq!(config.base_url.as_str(), "https://eu.api.photoshare.app/api");
		assert_eq!(config.timeout, Duration::from_millis(5000));
		assert_eq!(config.transfer_timeout, Environment::Production.default_transfer_timeout());
		assert_eq!(config.retry.max_attempts, 5);
		assert_eq!(config.retry.base_delay, Duration::from_millis(250));
	}

	#[test]
	fn json_errors_report_field_path() {
		let error = ClientConfig::from_json(r#"{"environment":"staging","timeout_ms":"soon"}"#)
			.expect_err("A string timeout should be rejected.");
		match error {
			ConfigError::Parse { source } => assert_eq!(source.path().to_string(), "timeout_ms"),
			other => panic!("Expected a parse error, got {other:?}."),
		}
	}
}
