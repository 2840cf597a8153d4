//! Resilient REST client for the photo-sharing backend: persisted credentials, single-flight
//! token refresh, classified backoff retries, and typed service wrappers in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod obs;
pub mod refresh;
pub mod retry;
pub mod services;
pub mod store;

pub use client::{ApiClient, ApiResponse, CancelHandle, RequestOptions};
pub use config::{ClientConfig, Environment};
pub use context::ClientContext;
pub use error::{Error, ErrorKind, NormalizedError, Result};

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{ErrorKind, NormalizedError, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
