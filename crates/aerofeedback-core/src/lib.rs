//! Core types and utilities for `AeroFeedback` clients
//!
//! Everything here is free of network I/O: the DTOs exchanged with the
//! backend, translation of form-editor drafts into backend payloads,
//! advisory client-side validation, and CSV export of collected responses.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod export;
pub mod payload;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use export::export_responses_csv;
pub use payload::{FormDraft, FormPayload};
pub use types::{
    Answer, Credentials, DashboardStats, DeletionRequest, DeletionStatus, Department, Form,
    FormData, FormRequest, FormRequestStatus, FormResponse, FormStatus, LoginResponse,
    NewFormRequest, Question, Role, Trainer, User,
};
pub use utils::DateInput;
pub use validation::RegisterRequest;

/// Initialize the logging system from the logging configuration.
///
/// Events go to stderr. `RUST_LOG` overrides the configured level when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(logging: &config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    installed.map_err(|e| Error::configuration(format!("Failed to initialize logging: {e}")))
}
