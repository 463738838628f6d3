//! REST client for the `AeroFeedback` training-feedback backend
//!
//! [`AdminService`] exposes one typed method per backend endpoint and
//! retries deletion approval with exponential backoff. [`AuthService`]
//! handles login and registration, keeping the bearer token in a
//! [`TokenStore`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::future_not_send
)]

pub mod auth;
pub mod error;
pub mod http;
pub mod retry;
pub mod service;
pub mod token;

pub use auth::AuthService;
pub use error::{ApprovalFailure, ClientError, ClientResult};
pub use http::ApiClient;
pub use retry::{AttemptFailure, RetryError, RetryPolicy, retry_with_backoff};
pub use service::AdminService;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

use aerofeedback_core::Config;
use std::sync::Arc;

/// Token store selected by configuration: the configured file, or the
/// default file under the platform config directory.
///
/// # Errors
///
/// Returns an error if no token file is configured and no config directory
/// can be determined.
pub fn token_store_from_config(config: &Config) -> ClientResult<Arc<dyn TokenStore>> {
    let store = match &config.auth.token_file {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::in_config_dir()?,
    };
    Ok(Arc::new(store))
}
