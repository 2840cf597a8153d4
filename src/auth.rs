//! Credential model, secret redaction, and request signing.

pub mod credential;
pub mod secret;
pub mod signer;

pub use credential::*;
pub use secret::*;
pub use signer::*;
