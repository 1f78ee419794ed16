//! Client configuration.
//!
//! Loaded from environment variables with defaults. The binary loads a
//! `.env` file first, so the same variables can live there.
//!
//! | Variable | Default |
//! |---|---|
//! | `TODO_API_URL` | `http://localhost:3000` |
//! | `TODO_STORAGE_PATH` | `.todo-sync/storage.json` |
//! | `TODO_SESSION_KEY` | `userInfo` |
//! | `TODO_AUTH_SCHEME` | unset (bare token) |
//! | `TODO_SHUTDOWN_TIMEOUT` | `5` (seconds) |

use crate::error::ConfigError;
use crate::vault::DEFAULT_SESSION_KEY;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default location of the storage file
pub const DEFAULT_STORAGE_PATH: &str = ".todo-sync/storage.json";

/// Default time allowed for in-flight operations at shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL (e.g. `https://todo.example.com/api`)
    pub api_url: String,
    /// File backing the persisted key-value storage
    pub storage_path: PathBuf,
    /// Storage key holding the serialized session
    pub session_key: String,
    /// Optional scheme put before the token in the `Authorization` header
    pub auth_scheme: Option<String>,
    /// Time allowed for in-flight operations when the app shuts down
    pub shutdown_timeout: Duration,
}

impl ClientConfig {
    /// Configuration for the backend at `api_url`, defaults elsewhere
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable holds an unparseable value or the
    /// resulting API URL is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shutdown_timeout = match lookup("TODO_SHUTDOWN_TIMEOUT") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    var: "TODO_SHUTDOWN_TIMEOUT",
                    value,
                })?,
            None => DEFAULT_SHUTDOWN_TIMEOUT,
        };

        let config = Self {
            api_url: lookup("TODO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            storage_path: lookup("TODO_STORAGE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from),
            session_key: lookup("TODO_SESSION_KEY")
                .filter(|key| !key.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string()),
            auth_scheme: lookup("TODO_AUTH_SCHEME").filter(|scheme| !scheme.trim().is_empty()),
            shutdown_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Set the storage file
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Set the session storage key
    #[must_use]
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// Set the authorization scheme (e.g. `Bearer`)
    #[must_use]
    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = Some(scheme.into());
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Check that the API URL is an absolute http(s) URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            auth_scheme: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
