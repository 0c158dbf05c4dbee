//! Unified error types for RegWatch.
//!
//! Two enums: [`RegWatchError`] for setup and data-store failures, and
//! [`SendError`] for a single provider call. Dispatch code catches both at
//! the smallest unit of work and turns them into summary counters or
//! delivery-log rows.

use thiserror::Error;

/// Result type alias using RegWatchError.
pub type Result<T> = std::result::Result<T, RegWatchError>;

#[derive(Error, Debug)]
pub enum RegWatchError {
    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Data-store errors
    #[error("Query error: {0}")]
    Query(String),

    #[error("Data store unreachable: {0}")]
    StoreUnavailable(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegWatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Short machine-readable kind, used in the trigger's error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::ConfigNotFound(_) => "configuration_error",
            Self::Query(_) | Self::StoreUnavailable(_) => "query_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether this error should abort a whole run rather than one unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ConfigNotFound(_) | Self::StoreUnavailable(_)
        )
    }
}

/// Failure of one provider call. Never retried by the sender itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Channel credentials are missing; every send on the channel fails.
    #[error("{0} channel is not configured")]
    NotConfigured(String),

    #[error("Invalid message content: {0}")]
    InvalidContent(String),

    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    /// Provider answered with a non-success status.
    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl SendError {
    /// Provider HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
