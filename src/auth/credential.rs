//! Persisted credential snapshot, partial updates, and the backend's token payload.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access/refresh token pair plus expiry and cached user record.
#[derive(Clone, Default)]
pub struct Credential {
	/// Access token presented as a bearer credential.
	pub access_token: Option<TokenSecret>,
	/// Refresh token exchanged for new access tokens.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry of the access token; meaningless without one.
	pub expires_at: Option<OffsetDateTime>,
	/// Opaque user record returned by the backend.
	pub user: Option<Value>,
}
impl Credential {
	/// Assembles a credential, dropping an expiry that has no access token to qualify.
	pub fn new(
		access_token: Option<TokenSecret>,
		refresh_token: Option<TokenSecret>,
		expires_at: Option<OffsetDateTime>,
		user: Option<Value>,
	) -> Self {
		let expires_at = access_token.as_ref().and(expires_at);

		Self { access_token, refresh_token, expires_at, user }
	}

	/// Returns `true` if the access token exists and has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		match (&self.access_token, self.expires_at) {
			(Some(_), Some(expires_at)) => instant >= expires_at,
			_ => false,
		}
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("user_cached", &self.user.is_some())
			.finish()
	}
}

/// Partial credential accepted by [`TokenStore::store`](crate::store::TokenStore::store).
///
/// Fields left unset are not touched in storage.
#[derive(Clone, Debug, Default)]
pub struct CredentialUpdate {
	pub(crate) access_token: Option<TokenSecret>,
	pub(crate) refresh_token: Option<TokenSecret>,
	pub(crate) expires_at: Option<OffsetDateTime>,
	pub(crate) expires_in: Option<Duration>,
	pub(crate) user: Option<Value>,
}
impl CredentialUpdate {
	/// Starts an empty update.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the access token.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the refresh token.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets an expiry relative to the moment the update is stored.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Sets the cached user record.
	pub fn user(mut self, user: Value) -> Self {
		self.user = Some(user);

		self
	}

	/// Returns `true` when the update carries no field at all.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none()
			&& self.refresh_token.is_none()
			&& self.expires_at.is_none()
			&& self.expires_in.is_none()
			&& self.user.is_none()
	}

	/// Resolves the expiry to an absolute instant; an explicit `expires_at` wins.
	pub(crate) fn resolved_expiry(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_at.or_else(|| self.expires_in.map(|delta| now + delta))
	}
}

/// Token payload returned by the login, register, and refresh endpoints.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: String,
	/// Rotated refresh token, when the backend issued one.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Access token lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// User record accompanying the grant.
	#[serde(default)]
	pub user: Option<Value>,
}
impl TokenGrant {
	/// Converts the grant into a credential update; non-positive lifetimes expire immediately.
	pub fn into_update(self) -> CredentialUpdate {
		let mut update = CredentialUpdate::new().access_token(self.access_token);

		if let Some(refresh) = self.refresh_token {
			update = update.refresh_token(refresh);
		}
		if let Some(seconds) = self.expires_in {
			update = update.expires_in(Duration::from_secs(seconds.max(0).unsigned_abs()));
		}
		if let Some(user) = self.user {
			update = update.user(user);
		}

		update
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("user", &self.user.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_without_access_token_is_dropped() {
		let credential = Credential::new(
			None,
			Some(TokenSecret::new("refresh")),
			Some(macros::datetime!(2025-01-01 00:00 UTC)),
			None,
		);

		assert!(credential.expires_at.is_none());
		assert!(!credential.is_expired_at(macros::datetime!(2030-01-01 00:00 UTC)));
	}

	#[test]
	fn expiry_compares_inclusively() {
		let expires = macros::datetime!(2025-01-01 01:00 UTC);
		let credential =
			Credential::new(Some(TokenSecret::new("access")), None, Some(expires), None);

		assert!(!credential.is_expired_at(macros::datetime!(2025-01-01 00:59 UTC)));
		assert!(credential.is_expired_at(expires));
	}

	#[test]
	fn grant_maps_into_update() {
		let grant: TokenGrant = serde_json::from_str(
			r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"user":{"id":7}}"#,
		)
		.expect("Token grant fixture should deserialize.");
		let update = grant.into_update();
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(update.access_token.as_ref().map(TokenSecret::expose), Some("a"));
		assert_eq!(update.refresh_token.as_ref().map(TokenSecret::expose), Some("r"));
		assert_eq!(update.resolved_expiry(now), Some(macros::datetime!(2025-01-01 01:00 UTC)));
		assert_eq!(update.user, Some(serde_json::json!({ "id": 7 })));
	}

	#[test]
	fn negative_lifetime_expires_immediately() {
		let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"a","expires_in":-5}"#)
			.expect("Token grant fixture should deserialize.");
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(grant.into_update().resolved_expiry(now), Some(now));
	}
}
