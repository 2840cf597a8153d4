//! Derives the `Authorization` header from the credential store.

// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenStore},
};

/// Computes bearer headers from the currently valid access token.
#[derive(Clone, Debug)]
pub struct RequestSigner {
	store: TokenStore,
}
impl RequestSigner {
	/// Creates a signer backed by `store`.
	pub fn new(store: TokenStore) -> Self {
		Self { store }
	}

	/// Returns `Bearer <token>`, or `None` when no valid non-empty token is stored.
	pub async fn authorization_header(&self) -> Result<Option<String>, StoreError> {
		let header = self
			.store
			.get_access_token()
			.await?
			.filter(|token| !token.is_blank())
			.map(|token| format!("Bearer {}", token.expose()));

		Ok(header)
	}
}
