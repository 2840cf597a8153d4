//! Credential persistence with lazy expiry cleanup.
//!
//! [`TokenStore`] is the only owner of the persisted [`Credential`]. Every operation holds an
//! async gate for its whole duration, so multi-key reads and writes never interleave with one
//! another even though each key lives in its own slot of the underlying [`KeyValueStore`].

// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialUpdate, TokenSecret},
	obs,
	store::{KeyValueStore, StoreError},
};

/// Key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key holding the access token expiry as unix milliseconds.
pub const TOKEN_EXPIRY_KEY: &str = "token_expiry";
/// Key holding the cached user record as JSON.
pub const USER_DATA_KEY: &str = "user_data";

/// Shared handle over the persisted credential; clones observe the same storage.
#[derive(Clone)]
pub struct TokenStore {
	backend: Arc<dyn KeyValueStore>,
	gate: Arc<AsyncMutex<()>>,
}
impl TokenStore {
	/// Wraps a key/value backend.
	pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
		Self { backend, gate: Default::default() }
	}

	/// Persists whichever fields the update carries; omitted fields stay as they are.
	pub async fn store(&self, update: CredentialUpdate) -> Result<(), StoreError> {
		let _gate = self.gate.lock().await;
		let expires_at = update.resolved_expiry(OffsetDateTime::now_utc());

		if let Some(token) = update.access_token {
			self.backend.set(ACCESS_TOKEN_KEY, token.expose().to_owned()).await?;
		}
		if let Some(token) = update.refresh_token {
			self.backend.set(REFRESH_TOKEN_KEY, token.expose().to_owned()).await?;
		}
		if let Some(instant) = expires_at {
			self.backend.set(TOKEN_EXPIRY_KEY, encode_instant(instant)).await?;
		}
		if let Some(user) = update.user {
			let raw = serde_json::to_string(&user).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize user record: {e}"),
			})?;

			self.backend.set(USER_DATA_KEY, raw).await?;
		}

		Ok(())
	}

	/// Returns the access token unless it is missing or expired.
	///
	/// An expired token (or one whose stored expiry cannot be read) is removed together with
	/// its expiry before returning `None`.
	pub async fn get_access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		let _gate = self.gate.lock().await;

		self.valid_access_token(OffsetDateTime::now_utc()).await
	}

	/// Returns the stored refresh token.
	pub async fn get_refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		let _gate = self.gate.lock().await;

		Ok(self.backend.get(REFRESH_TOKEN_KEY).await?.map(TokenSecret::new))
	}

	/// Returns the expiry of the stored access token; `None` when no access token exists.
	pub async fn get_expires_at(&self) -> Result<Option<OffsetDateTime>, StoreError> {
		let _gate = self.gate.lock().await;

		if self.backend.get(ACCESS_TOKEN_KEY).await?.is_none() {
			return Ok(None);
		}

		Ok(self.backend.get(TOKEN_EXPIRY_KEY).await?.as_deref().and_then(decode_instant))
	}

	/// Returns the cached user record.
	pub async fn get_user(&self) -> Result<Option<Value>, StoreError> {
		let _gate = self.gate.lock().await;

		self.read_user().await
	}

	/// `true` iff a non-expired access token is available.
	pub async fn is_authenticated(&self) -> Result<bool, StoreError> {
		Ok(self.get_access_token().await?.is_some())
	}

	/// Returns the full credential, applying the same expiry rule as
	/// [`TokenStore::get_access_token`].
	pub async fn snapshot(&self) -> Result<Credential, StoreError> {
		let _gate = self.gate.lock().await;
		let now = OffsetDateTime::now_utc();
		let access_token = self.valid_access_token(now).await?;
		let expires_at = match access_token {
			Some(_) =>
				self.backend.get(TOKEN_EXPIRY_KEY).await?.as_deref().and_then(decode_instant),
			None => None,
		};
		let refresh_token = self.backend.get(REFRESH_TOKEN_KEY).await?.map(TokenSecret::new);
		let user = self.read_user().await?;

		Ok(Credential::new(access_token, refresh_token, expires_at, user))
	}

	/// Removes every credential field.
	///
	/// Each removal is attempted even if an earlier one fails; the first failure is returned so
	/// callers know local session state may be partially cleared.
	pub async fn clear_all(&self) -> Result<(), StoreError> {
		let _gate = self.gate.lock().await;
		let mut first_failure = None;

		for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY, USER_DATA_KEY] {
			if let Err(e) = self.backend.remove(key).await {
				obs::storage_failure("clear_all", &e);

				first_failure.get_or_insert(e);
			}
		}

		match first_failure {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	async fn valid_access_token(
		&self,
		now: OffsetDateTime,
	) -> Result<Option<TokenSecret>, StoreError> {
		let Some(token) = self.backend.get(ACCESS_TOKEN_KEY).await? else {
			return Ok(None);
		};
		let expired = match self.backend.get(TOKEN_EXPIRY_KEY).await? {
			Some(raw) => decode_instant(&raw).is_none_or(|expires_at| now >= expires_at),
			None => false,
		};

		if expired {
			self.backend.remove(ACCESS_TOKEN_KEY).await?;
			self.backend.remove(TOKEN_EXPIRY_KEY).await?;

			return Ok(None);
		}

		Ok(Some(TokenSecret::new(token)))
	}

	async fn read_user(&self) -> Result<Option<Value>, StoreError> {
		let Some(raw) = self.backend.get(USER_DATA_KEY).await? else {
			return Ok(None);
		};

		serde_json::from_str(&raw).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse cached user record: {e}"),
		})
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenStore(..)")
	}
}

fn encode_instant(instant: OffsetDateTime) -> String {
	(instant.unix_timestamp_nanos() / 1_000_000).to_string()
}

fn decode_instant(raw: &str) -> Option<OffsetDateTime> {
	let millis = raw.trim().parse::<i128>().ok()?;

	OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn instants_round_trip_at_millisecond_precision() {
		let instant = macros::datetime!(2025-03-04 05:06:07.891 UTC);

		assert_eq!(decode_instant(&encode_instant(instant)), Some(instant));
		assert_eq!(decode_instant("garbage"), None);
	}
}
