//! Request and response interception around each attempt.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
