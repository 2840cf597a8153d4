//! Dependency container tying configuration, storage, client, and services together.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	config::ClientConfig,
	http::HttpBackend,
	services::{AuthService, GroupService, PhotoService, ProfileService},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestBackend};

/// Owns the active configuration, the credential store, and the client built from them.
///
/// Services handed out by the accessors share the current client. After
/// [`ClientContext::reconfigure`] the context holds a fresh client (with fresh refresh state);
/// services obtained earlier keep talking to the previous one.
pub struct ClientContext {
	config: ClientConfig,
	store: TokenStore,
	backend: Arc<dyn HttpBackend>,
	client: Arc<ApiClient>,
}
impl ClientContext {
	/// Builds a context on the default reqwest backend.
	#[cfg(feature = "reqwest")]
	pub fn new(config: ClientConfig, store: TokenStore) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self::with_backend(config, store, Arc::new(ReqwestBackend::with_client(client))))
	}

	/// Builds a context on a caller-provided backend, reused across reconfigurations.
	pub fn with_backend(
		config: ClientConfig,
		store: TokenStore,
		backend: Arc<dyn HttpBackend>,
	) -> Self {
		let client = Arc::new(ApiClient::with_backend(&config, store.clone(), backend.clone()));

		Self { config, store, backend, client }
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential store shared by every client this context builds.
	pub fn token_store(&self) -> &TokenStore {
		&self.store
	}

	/// Current client.
	pub fn client(&self) -> Arc<ApiClient> {
		self.client.clone()
	}

	/// Auth service over the current client.
	pub fn auth(&self) -> AuthService {
		AuthService::new(self.client())
	}

	/// Profile service over the current client.
	pub fn profile(&self) -> ProfileService {
		ProfileService::new(self.client())
	}

	/// Group service over the current client.
	pub fn groups(&self) -> GroupService {
		GroupService::new(self.client())
	}

	/// Photo service over the current client.
	pub fn photos(&self) -> PhotoService {
		PhotoService::new(self.client())
	}

	/// Switches to `config`, rebuilding the client on the same backend.
	///
	/// Stored credentials survive; in-flight calls on the old client finish against it.
	pub fn reconfigure(&mut self, config: ClientConfig) {
		self.client =
			Arc::new(ApiClient::with_backend(&config, self.store.clone(), self.backend.clone()));
		self.config = config;
	}
}
impl Debug for ClientContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientContext")
			.field("config", &self.config)
			.field("client", &self.client)
			.finish_non_exhaustive()
	}
}
