//! Session lifecycle: sign-in, registration, sign-out, and password recovery.

// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	client::{ApiClient, RequestOptions},
	endpoints,
	obs,
	services::{User, decode_value},
};

/// Credentials submitted to `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details submitted to `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct Registration {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Display name.
	pub name: String,
}
impl Debug for Registration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registration")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("name", &self.name)
			.finish()
	}
}

/// Result of a successful sign-in or registration.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
	/// Signed-in account, when the server returned it.
	pub user: Option<User>,
	/// Access token expiry, when the server announced a lifetime.
	pub expires_at: Option<OffsetDateTime>,
}

/// Auth endpoints plus the local session they control.
#[derive(Clone, Debug)]
pub struct AuthService {
	client: Arc<ApiClient>,
}
impl AuthService {
	/// Creates a service over `client`.
	pub fn new(client: Arc<ApiClient>) -> Self {
		Self { client }
	}

	/// Signs in and persists the returned credential.
	pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
		let payload = LoginRequest { email: email.into(), password: password.into() };
		let grant: TokenGrant =
			self.client.post(endpoints::auth::LOGIN, &payload, RequestOptions::new()).await?;

		self.open_session(grant).await
	}

	/// Creates an account and persists the returned credential.
	pub async fn register(&self, registration: &Registration) -> Result<Session> {
		let grant: TokenGrant =
			self.client.post(endpoints::auth::REGISTER, registration, RequestOptions::new()).await?;

		self.open_session(grant).await
	}

	/// Signs out.
	///
	/// The server call is best-effort: the local session is cleared whether or not it succeeds,
	/// and only a local storage failure is reported.
	pub async fn logout(&self) -> Result<()> {
		let store = self.client.token_store();
		let refresh_token = store.get_refresh_token().await.ok().flatten();
		let payload = serde_json::json!({
			"refresh_token": refresh_token.as_ref().map(|token| token.expose()),
		});

		if let Err(e) = self
			.client
			.post::<Value, _>(endpoints::auth::LOGOUT, &payload, RequestOptions::new())
			.await
		{
			#[cfg(feature = "tracing")]
			tracing::debug!(kind = e.kind.as_str(), "server-side logout failed");
			#[cfg(not(feature = "tracing"))]
			let _ = e;
		}

		store.clear_all().await?;
		obs::session_cleared("logout");
		obs::record_session_cleared("logout");

		Ok(())
	}

	/// Starts a password reset for `email`.
	pub async fn forgot_password(&self, email: &str) -> Result<()> {
		let payload = serde_json::json!({ "email": email });
		let _: Value = self
			.client
			.post(endpoints::auth::FORGOT_PASSWORD, &payload, RequestOptions::new())
			.await?;

		Ok(())
	}

	/// Completes a password reset with the emailed `token`.
	pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
		let payload = serde_json::json!({ "token": token, "password": new_password });
		let _: Value = self
			.client
			.post(endpoints::auth::RESET_PASSWORD, &payload, RequestOptions::new())
			.await?;

		Ok(())
	}

	/// Cached user record, without a network call.
	pub async fn current_user(&self) -> Result<Option<User>> {
		match self.client.token_store().get_user().await? {
			Some(value) => Ok(Some(decode_value(value)?)),
			None => Ok(None),
		}
	}

	/// `true` iff a non-expired access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.client.token_store().is_authenticated().await?)
	}

	async fn open_session(&self, grant: TokenGrant) -> Result<Session> {
		if grant.access_token.trim().is_empty() {
			return Err(NormalizedError::authentication("Server did not issue an access token.").into());
		}

		let user = grant.user.clone().map(decode_value::<User>).transpose()?;
		let store = self.client.token_store();

		store.store(grant.into_update()).await?;

		Ok(Session { user, expires_at: store.get_expires_at().await? })
	}
}
