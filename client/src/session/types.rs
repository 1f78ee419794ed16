//! State, actions and environment of the session feature.

use crate::error::ApiError;
use crate::notice::{Notice, Operation};
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::types::{Password, Session, User};
use crate::vault::SessionVault;
use std::sync::Arc;
use todo_sync_core::environment::Clock;

/// Session state
///
/// `session` is `None` when logged out. `is_loading` covers register, login
/// and logout; overlapping calls are the caller's problem and are not
/// guarded against.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Current session
    pub session: Option<Session>,
    /// A register, login or logout call is in flight
    pub is_loading: bool,
    /// Startup restoration is in progress
    pub is_restoring: bool,
    /// Last failure reported to the user
    pub notice: Option<Notice>,
}

impl SessionState {
    /// Token of the current session
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    /// User of the current session
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// Whether a session is held
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }
}

/// Session actions
///
/// Commands come from the view layer; the rest are results fed back by
/// effects.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    // ========== Commands ==========
    /// Create an account and sign in with it
    Register {
        /// Display name
        name: String,
        /// Login email
        email: String,
        /// Password
        password: Password,
    },
    /// Sign in
    Login {
        /// Login email
        email: String,
        /// Password
        password: Password,
    },
    /// Sign out and forget the persisted session
    Logout,
    /// Load the persisted session (once, at startup)
    RestoreSession,
    /// Hide the current notice
    DismissNotice,

    // ========== Results ==========
    /// Account created; the session is persisted
    Registered {
        /// New session
        session: Session,
    },
    /// Signed in; the session is persisted
    LoggedIn {
        /// New session
        session: Session,
    },
    /// Register or login was refused or failed
    AuthFailed {
        /// Which call failed
        operation: Operation,
        /// Why
        error: ApiError,
    },
    /// The backend issued a session but it could not be saved
    PersistFailed {
        /// Which call issued the session
        operation: Operation,
        /// Storage error text
        reason: String,
    },
    /// Local and persisted session are gone
    LoggedOut,
    /// Restoration finished
    SessionRestored {
        /// Persisted session, `None` if absent or unreadable
        session: Option<Session>,
    },
}

/// Session dependencies
#[derive(Clone)]
pub struct SessionEnvironment<B, K> {
    /// REST backend
    pub backend: B,
    /// Persisted session
    pub vault: SessionVault<K>,
    /// Clock for notice timestamps
    pub clock: Arc<dyn Clock>,
}

impl<B, K> SessionEnvironment<B, K>
where
    B: TodoBackend,
    K: KeyValueStorage,
{
    /// Creates a new `SessionEnvironment`
    #[must_use]
    pub fn new(backend: B, vault: SessionVault<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            vault,
            clock,
        }
    }
}
