//! User-facing notices.
//!
//! Store operations never return errors. A failure is recorded as a
//! [`Notice`] in the store's state, where the view layer picks it up and
//! shows it for [`NOTICE_TTL`]. Every mapping from [`ApiError`] to notice
//! text lives in this module.

use crate::error::ApiError;
use crate::types::TodoFilter;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Fallback detail when the server gave no message
pub const GENERIC_DETAIL: &str = "An error occurred";

/// Category of a notice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Rejected locally before any request was made
    Validation,
    /// HTTP 409 from the backend
    Conflict,
    /// Login refused
    InvalidCredentials,
    /// Transport or server failure
    Failure,
}

/// Operation a notice is about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Account creation
    Register,
    /// Sign in
    Login,
    /// Fetch a list of todos
    Fetch(TodoFilter),
    /// Refresh one todo
    FetchOne,
    /// Create a todo
    Create,
    /// Flip a todo's completion flag
    Toggle,
    /// Rename or re-flag a todo
    Update,
    /// Delete a todo
    Delete,
}

impl Operation {
    /// Title shown when the operation fails
    #[must_use]
    pub const fn failure_title(self) -> &'static str {
        match self {
            Self::Register => "Registration Failed",
            Self::Login => "Login Failed",
            Self::Fetch(TodoFilter::All) => "Fetching Todos Failed",
            Self::Fetch(TodoFilter::Completed) => "Fetching completed Todos Failed",
            Self::Fetch(TodoFilter::Incomplete) => "Fetching incompleted Todos Failed",
            Self::FetchOne => "Fetching Todo Failed",
            Self::Create => "Adding Todo Failed",
            Self::Toggle => "Toggling Todo Failed",
            Self::Update => "Updating Todo Failed",
            Self::Delete => "Deleting Todo Failed",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => f.write_str("register"),
            Self::Login => f.write_str("login"),
            Self::Fetch(TodoFilter::All) => f.write_str("fetch_all"),
            Self::Fetch(TodoFilter::Completed) => f.write_str("fetch_completed"),
            Self::Fetch(TodoFilter::Incomplete) => f.write_str("fetch_incomplete"),
            Self::FetchOne => f.write_str("fetch_one"),
            Self::Create => f.write_str("create"),
            Self::Toggle => f.write_str("toggle"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Transient message for the view layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Category
    pub kind: NoticeKind,
    /// Headline
    pub title: String,
    /// Explanation
    pub detail: String,
    /// When the notice was raised
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    /// Creates a notice
    #[must_use]
    pub fn new(
        kind: NoticeKind,
        title: impl Into<String>,
        detail: impl Into<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: detail.into(),
            raised_at,
        }
    }

    /// Notice for a todo name that is blank after trimming
    #[must_use]
    pub fn empty_name(raised_at: DateTime<Utc>) -> Self {
        Self::new(
            NoticeKind::Validation,
            "Todo cannot be empty",
            "Please enter a name for your todo",
            raised_at,
        )
    }

    /// Notice for a session the backend issued but storage could not keep
    #[must_use]
    pub fn unsaved_session(operation: Operation, raised_at: DateTime<Utc>) -> Self {
        Self::new(
            NoticeKind::Failure,
            operation.failure_title(),
            "Could not save your session",
            raised_at,
        )
    }

    /// Maps a backend failure of `operation` to a notice
    ///
    /// - 409 is a conflict. On register the server message is replaced by a
    ///   fixed "already exists" text.
    /// - A login answered with 400, 401 or 404 means bad credentials.
    /// - Anything else is a generic failure carrying the server's message.
    #[must_use]
    pub fn from_api_error(operation: Operation, error: &ApiError, raised_at: DateTime<Utc>) -> Self {
        let title = operation.failure_title();

        match (operation, error) {
            (Operation::Register, ApiError::Conflict { .. }) => Self::new(
                NoticeKind::Conflict,
                title,
                "An account with this email already exists",
                raised_at,
            ),
            (_, ApiError::Conflict { message }) => Self::new(
                NoticeKind::Conflict,
                title,
                message
                    .as_deref()
                    .unwrap_or("A todo with this name already exists"),
                raised_at,
            ),
            (Operation::Login, error) if is_credential_rejection(error) => Self::new(
                NoticeKind::InvalidCredentials,
                title,
                error
                    .server_message()
                    .unwrap_or("Invalid email or password"),
                raised_at,
            ),
            (_, error) => Self::new(
                NoticeKind::Failure,
                title,
                error.server_message().unwrap_or(GENERIC_DETAIL),
                raised_at,
            ),
        }
    }

    /// Whether the notice has outlived [`NOTICE_TTL`] at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.raised_at)
            .to_std()
            .is_ok_and(|age| age >= NOTICE_TTL)
    }
}

const fn is_credential_rejection(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::Unauthorized { .. } | ApiError::Status { status: 400 | 404, .. }
    )
}
