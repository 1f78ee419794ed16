//! Session feature: authenticate, hold and persist the current session.
//!
//! [`SessionStore`] is what the view layer talks to. Its operations never
//! fail: outcomes show up as state changes and as a [`Notice`].

pub mod reducer;
pub mod types;

pub use reducer::SessionReducer;
pub use types::{SessionAction, SessionEnvironment, SessionState};

use crate::notice::Notice;
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::types::{Password, Session, User};
use std::sync::Arc;
use std::time::Duration;
use todo_sync_core::environment::Clock;
use todo_sync_runtime::{Store, StoreError};
use tokio::sync::broadcast;

/// Runtime store specialised for the session feature
type SessionRuntime<B, K> =
    Store<SessionState, SessionAction, SessionEnvironment<B, K>, SessionReducer<B, K>>;

/// Session Store
///
/// Owns the current user's identity and token, persists them through the
/// [`SessionVault`](crate::vault::SessionVault) and restores them at startup.
pub struct SessionStore<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    store: SessionRuntime<B, K>,
    clock: Arc<dyn Clock>,
}

impl<B, K> SessionStore<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    /// Create a logged-out store
    #[must_use]
    pub fn new(environment: SessionEnvironment<B, K>) -> Self {
        let clock = Arc::clone(&environment.clock);
        Self {
            store: Store::new(SessionState::default(), SessionReducer::new(), environment),
            clock,
        }
    }

    /// Create an account and sign in with it
    ///
    /// # Returns
    ///
    /// `true` once the backend accepted the registration and the session is
    /// saved and held. On failure a notice is raised and `false` returned.
    #[tracing::instrument(skip(self, name, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> bool {
        let produced = self
            .dispatch(SessionAction::Register {
                name: name.to_string(),
                email: email.to_string(),
                password: Password::new(password),
            })
            .await;

        produced
            .iter()
            .any(|action| matches!(action, SessionAction::Registered { .. }))
    }

    /// Sign in
    ///
    /// # Returns
    ///
    /// `true` once the session is saved and held. On failure a notice is
    /// raised, `false` returned and any prior session left in place.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let produced = self
            .dispatch(SessionAction::Login {
                email: email.to_string(),
                password: Password::new(password),
            })
            .await;

        produced
            .iter()
            .any(|action| matches!(action, SessionAction::LoggedIn { .. }))
    }

    /// Sign out
    ///
    /// The local and persisted session are cleared even when the backend
    /// cannot be reached.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) {
        self.dispatch(SessionAction::Logout).await;
    }

    /// Load the persisted session, if any
    ///
    /// An unreadable entry counts as "no session" and is deleted.
    #[tracing::instrument(skip(self))]
    pub async fn restore_session(&self) {
        self.dispatch(SessionAction::RestoreSession).await;
    }

    /// Hide the current notice
    pub async fn dismiss_notice(&self) {
        self.dispatch(SessionAction::DismissNotice).await;
    }

    /// Current session
    pub async fn session(&self) -> Option<Session> {
        self.store.state(|s| s.session.clone()).await
    }

    /// Current user
    pub async fn user(&self) -> Option<User> {
        self.store.state(|s| s.user().cloned()).await
    }

    /// Current token
    pub async fn token(&self) -> Option<String> {
        self.store.state(|s| s.token().map(str::to_owned)).await
    }

    /// Whether a session is held
    pub async fn is_logged_in(&self) -> bool {
        self.store.state(SessionState::is_logged_in).await
    }

    /// Whether register, login or logout is in flight
    pub async fn is_loading(&self) -> bool {
        self.store.state(|s| s.is_loading).await
    }

    /// Whether startup restoration is in progress
    pub async fn is_restoring(&self) -> bool {
        self.store.state(|s| s.is_restoring).await
    }

    /// Notice still within its display window
    pub async fn notice(&self) -> Option<Notice> {
        let now = self.clock.now();
        self.store
            .state(|s| s.notice.clone())
            .await
            .filter(|notice| !notice.is_expired(now))
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> SessionState {
        self.store.state(Clone::clone).await
    }

    /// Stream of result actions, for views that react to changes
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<SessionAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting operations and wait for in-flight ones
    ///
    /// Results arriving afterwards are dropped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShutdownTimeout` if operations are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(&self, action: SessionAction) -> Vec<SessionAction> {
        match self.store.send_and_collect(action).await {
            Ok(produced) => produced,
            Err(error) => {
                tracing::warn!(%error, "Session store rejected action");
                Vec::new()
            },
        }
    }
}
