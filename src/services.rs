//! Typed wrappers over [`ApiClient`](crate::ApiClient) for each backend resource.
//!
//! Services are cheap handles around a shared client; build them through
//! [`ClientContext`](crate::ClientContext) so they pick up the current configuration.

pub mod auth;
pub mod groups;
pub mod photos;
pub mod profile;

pub use auth::*;
pub use groups::*;
pub use photos::*;
pub use profile::*;

// self
use crate::_prelude::*;

/// Account record returned by auth and profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Server-side identifier.
	pub id: String,
	/// Login email.
	pub email: String,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Avatar image URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
	/// Short biography.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
}

/// Decodes an already-parsed JSON value, keeping the failing path in the message.
pub(crate) fn decode_value<T>(value: Value) -> Result<T, NormalizedError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(NormalizedError::decode)
}
