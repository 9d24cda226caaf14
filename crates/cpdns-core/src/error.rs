//! Error types for cpdns
//!
//! The variants follow the failure taxonomy of a reconciliation run. Whether
//! an error aborts the run or stays local to one record is decided by the
//! engine, not by the variant alone: a `Network` error during IP discovery or
//! a panel session transition is fatal, while the same kind during a single
//! record mutation is only recorded in that record's result.

use thiserror::Error;

/// Result type alias for cpdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cpdns
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Transport failure or timeout on a DNS or HTTP call
    #[error("Network error: {0}")]
    Network(String),

    /// A session transition did not yield the expected cookie
    ///
    /// The panel gives no explicit login failure signal, so rejected
    /// credentials and a dropped session look the same from here.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Expected markup or response field missing or malformed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed response without a success indicator
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Planned record absent from the scraped panel table
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery failed
    #[error("Notification failed: {0}")]
    Notify(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Short name of the error kind, attached to log events as the `kind` field
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Auth(_) => "auth",
            Error::Parse(_) => "parse",
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Config(_) => "config",
            Error::Notify(_) => "notify",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
