//! Error types for the `AeroFeedback` core crate

use std::collections::BTreeMap;
use std::{error::Error as StdError, fmt};

/// Main error type for the `AeroFeedback` core crate
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Client-side validation failed for one or more fields
    Validation {
        /// Messages keyed by field name
        fields: BTreeMap<String, Vec<String>>,
    },

    /// There were no responses to export
    NoResponses,

    /// CSV writer error
    Csv(csv::Error),

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Messages for the given field, if validation failed on it
    pub fn field_messages(&self, field: &str) -> &[String] {
        match self {
            Self::Validation { fields } => fields.get(field).map_or(&[], Vec::as_slice),
            _ => &[],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { fields } => {
                let summary = fields
                    .iter()
                    .map(|(field, messages)| format!("{field} - {}", messages.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation error: {summary}")
            }
            Self::NoResponses => write!(f, "No responses available to export"),
            Self::Csv(err) => write!(f, "CSV error: {err}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
