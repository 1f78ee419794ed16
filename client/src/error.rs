//! Error types for backend, storage and configuration operations.
//!
//! None of these reach the view layer: the stores catch them at their
//! boundary and turn them into notices (see [`crate::notice`]) or log lines.

use thiserror::Error;

/// Errors returned by a [`TodoBackend`](crate::providers::TodoBackend)
///
/// Carried inside actions, so it is `Clone` and holds only owned strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    // ═══════════════════════════════════════════════════════════
    // Rejected by the server
    // ═══════════════════════════════════════════════════════════

    /// HTTP 409: duplicate email or duplicate todo name
    #[error("Conflict: {}", message.as_deref().unwrap_or("resource already exists"))]
    Conflict {
        /// `message` field of the response body, if any
        message: Option<String>,
    },

    /// HTTP 401: missing, expired or invalid credentials
    #[error("Unauthorized: {}", message.as_deref().unwrap_or("invalid credentials"))]
    Unauthorized {
        /// `message` field of the response body, if any
        message: Option<String>,
    },

    /// Any other non-2xx status
    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code
        status: u16,
        /// `message` field of the response body, if any
        message: Option<String>,
    },

    // ═══════════════════════════════════════════════════════════
    // Never reached the server, or unreadable answer
    // ═══════════════════════════════════════════════════════════

    /// Connection, DNS or TLS failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// 2xx response whose body did not match the expected shape
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message the server attached to the failure, if any
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Conflict { message }
            | Self::Unauthorized { message }
            | Self::Status { message, .. } => message.as_deref(),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// HTTP status of the failure, if the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Conflict { .. } => Some(409),
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Errors from the persisted key-value storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be parsed
    #[error("Stored value for '{key}' is corrupt: {reason}")]
    Corrupt {
        /// Key (or file) holding the bad value
        key: String,
        /// Parser error
        reason: String,
    },

    /// A value could not be serialized for storage
    #[error("Failed to serialize value: {0}")]
    Serialize(String),
}

/// Invalid client configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The backend base URL is not an absolute http(s) URL
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// Rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// An environment variable held an unparseable value
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Rejected value
        value: String,
    },
}
