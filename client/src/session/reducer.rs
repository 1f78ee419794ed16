//! Reducer logic for the session feature.
//!
//! Network calls and persistence run inside effects. A successful register
//! or login writes the session to the vault before the result action is fed
//! back, so the caller only hears "success" once the backend has confirmed
//! it and the session is stored. A session that cannot be stored is not
//! adopted: todo calls read their token from the vault.

use crate::error::StorageError;
use crate::notice::{Notice, Operation};
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::session::types::{SessionAction, SessionEnvironment, SessionState};
use crate::types::Session;
use crate::vault::SessionVault;
use todo_sync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// Reducer for the session feature
#[derive(Debug, Clone)]
pub struct SessionReducer<B, K> {
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(B, K)>,
}

impl<B, K> SessionReducer<B, K> {
    /// Creates a new `SessionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<B, K> Default for SessionReducer<B, K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write an issued session to the vault and pick the result action
async fn persist<K: KeyValueStorage>(
    vault: &SessionVault<K>,
    operation: Operation,
    session: Session,
    signed_in: fn(Session) -> SessionAction,
) -> SessionAction {
    match vault.save(&session).await {
        Ok(()) => signed_in(session),
        Err(error) => SessionAction::PersistFailed {
            operation,
            reason: error.to_string(),
        },
    }
}

/// Read the persisted session. Unreadable means "no session"; a corrupt
/// entry is also deleted so the next start does not trip over it.
async fn restore<K: KeyValueStorage>(vault: &SessionVault<K>) -> Option<Session> {
    match vault.load().await {
        Ok(session) => session,
        Err(error @ StorageError::Corrupt { .. }) => {
            tracing::warn!(%error, "Discarding corrupt persisted session");
            if let Err(error) = vault.clear().await {
                tracing::warn!(%error, "Failed to remove corrupt session");
            }
            None
        },
        Err(error) => {
            tracing::warn!(%error, "Could not read persisted session");
            None
        },
    }
}

impl<B, K> Reducer for SessionReducer<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<B, K>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Register: create account, persist, report
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Register {
                name,
                email,
                password,
            } => {
                state.is_loading = true;
                state.notice = None;

                let backend = env.backend.clone();
                let vault = env.vault.clone();

                smallvec![Effect::Future(Box::pin(async move {
                    match backend.register(&name, &email, password.expose()).await {
                        Ok(session) => Some(
                            persist(&vault, Operation::Register, session, |session| {
                                SessionAction::Registered { session }
                            })
                            .await,
                        ),
                        Err(error) => Some(SessionAction::AuthFailed {
                            operation: Operation::Register,
                            error,
                        }),
                    }
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // Login: authenticate, persist, report
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Login { email, password } => {
                state.is_loading = true;
                state.notice = None;

                let backend = env.backend.clone();
                let vault = env.vault.clone();

                smallvec![Effect::Future(Box::pin(async move {
                    match backend.login(&email, password.expose()).await {
                        Ok(session) => Some(
                            persist(&vault, Operation::Login, session, |session| {
                                SessionAction::LoggedIn { session }
                            })
                            .await,
                        ),
                        Err(error) => Some(SessionAction::AuthFailed {
                            operation: Operation::Login,
                            error,
                        }),
                    }
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // Logout: notify backend, then clear no matter what
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Logout => {
                state.is_loading = true;

                let token = state.token().map(str::to_owned);
                let backend = env.backend.clone();
                let vault = env.vault.clone();

                smallvec![Effect::Future(Box::pin(async move {
                    match token {
                        Some(token) => {
                            if let Err(error) = backend.logout(&token).await {
                                tracing::warn!(%error, "Logout request failed, clearing session anyway");
                            }
                        },
                        None => tracing::debug!("No session held, skipping logout request"),
                    }

                    if let Err(error) = vault.clear().await {
                        tracing::warn!(%error, "Failed to remove persisted session");
                    }

                    Some(SessionAction::LoggedOut)
                }))]
            },

            // ═══════════════════════════════════════════════════════════════
            // RestoreSession: load persisted session at startup
            // ═══════════════════════════════════════════════════════════════
            SessionAction::RestoreSession => {
                state.is_restoring = true;

                let vault = env.vault.clone();

                smallvec![Effect::Future(Box::pin(async move {
                    Some(SessionAction::SessionRestored {
                        session: restore(&vault).await,
                    })
                }))]
            },

            SessionAction::DismissNotice => {
                state.notice = None;
                smallvec![Effect::None]
            },

            // ========== Results ==========
            SessionAction::Registered { session } | SessionAction::LoggedIn { session } => {
                tracing::info!(user = %session.user.email, "Signed in");
                state.is_loading = false;
                state.session = Some(session);
                smallvec![Effect::None]
            },

            SessionAction::AuthFailed { operation, error } => {
                tracing::warn!(%operation, %error, "Authentication failed");
                state.is_loading = false;
                state.notice = Some(Notice::from_api_error(operation, &error, env.clock.now()));
                smallvec![Effect::None]
            },

            SessionAction::PersistFailed { operation, reason } => {
                tracing::warn!(%operation, %reason, "Failed to persist session");
                state.is_loading = false;
                state.notice = Some(Notice::unsaved_session(operation, env.clock.now()));
                smallvec![Effect::None]
            },

            SessionAction::LoggedOut => {
                tracing::info!("Signed out");
                state.is_loading = false;
                state.session = None;
                smallvec![Effect::None]
            },

            SessionAction::SessionRestored { session } => {
                tracing::debug!(restored = session.is_some(), "Session restoration finished");
                state.is_restoring = false;
                state.session = session;
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::mocks::{MemoryStorage, MockBackend};
    use crate::notice::NoticeKind;
    use crate::types::{Password, User};
    use std::sync::Arc;
    use todo_sync_core::environment::Clock;
    use todo_sync_testing::{assertions, test_clock, ReducerTest};

    type TestReducer = SessionReducer<MockBackend, MemoryStorage>;

    fn env() -> SessionEnvironment<MockBackend, MemoryStorage> {
        SessionEnvironment::new(
            MockBackend::new(),
            SessionVault::new(MemoryStorage::new()),
            Arc::new(test_clock()),
        )
    }

    fn session(token: &str) -> Session {
        Session::new(
            token.to_string(),
            User {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        )
    }

    fn logged_in(token: &str) -> SessionState {
        SessionState {
            session: Some(session(token)),
            ..SessionState::default()
        }
    }

    #[test]
    fn login_starts_request() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::Login {
                email: "ada@example.com".to_string(),
                password: Password::new("secret"),
            })
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.session.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn register_clears_stale_notice() {
        let stale = Notice::empty_name(test_clock().now());

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState {
                notice: Some(stale),
                ..SessionState::default()
            })
            .when_action(SessionAction::Register {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: Password::new("secret"),
            })
            .then_state(|state| {
                assert!(state.notice.is_none());
                assert!(state.is_loading);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn logged_in_stores_session() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState {
                is_loading: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::LoggedIn {
                session: session("t1"),
            })
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.token(), Some("t1"));
                assert_eq!(state.user().map(|u| u.id.as_str()), Some("u1"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn failed_login_keeps_prior_session() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(logged_in("t1"))
            .when_actions([
                SessionAction::Login {
                    email: "ada@example.com".to_string(),
                    password: Password::new("wrong"),
                },
                SessionAction::AuthFailed {
                    operation: Operation::Login,
                    error: ApiError::Unauthorized { message: None },
                },
            ])
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.token(), Some("t1"));

                let notice = state.notice.as_ref().unwrap();
                assert_eq!(notice.kind, NoticeKind::InvalidCredentials);
                assert_eq!(notice.raised_at, test_clock().now());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn register_conflict_reports_existing_account() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::AuthFailed {
                operation: Operation::Register,
                error: ApiError::Conflict { message: None },
            })
            .then_state(|state| {
                assert!(state.session.is_none());
                let notice = state.notice.as_ref().unwrap();
                assert_eq!(notice.kind, NoticeKind::Conflict);
                assert_eq!(notice.detail, "An account with this email already exists");
            })
            .run();
    }

    #[test]
    fn logout_then_logged_out_clears_session() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(logged_in("t1"))
            .when_action(SessionAction::Logout)
            .then_state(|state| assert!(state.is_loading))
            .then_effects(assertions::assert_has_future_effect)
            .run();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(logged_in("t1"))
            .when_actions([SessionAction::Logout, SessionAction::LoggedOut])
            .then_state(|state| {
                assert!(!state.is_logged_in());
                assert!(!state.is_loading);
            })
            .run();
    }

    #[test]
    fn restore_toggles_restoring_flag() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::RestoreSession)
            .then_state(|state| assert!(state.is_restoring))
            .then_effects(assertions::assert_has_future_effect)
            .run();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_actions([
                SessionAction::RestoreSession,
                SessionAction::SessionRestored {
                    session: Some(session("t9")),
                },
            ])
            .then_state(|state| {
                assert!(!state.is_restoring);
                assert_eq!(state.token(), Some("t9"));
            })
            .run();
    }

    #[test]
    fn dismiss_notice() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState {
                notice: Some(Notice::empty_name(test_clock().now())),
                ..SessionState::default()
            })
            .when_action(SessionAction::DismissNotice)
            .then_state(|state| assert!(state.notice.is_none()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn restore_deletes_corrupt_entry() {
        let storage = MemoryStorage::new();
        storage.insert("userInfo", "not json");
        let vault = SessionVault::new(storage.clone());

        assert_eq!(restore(&vault).await, None);
        assert!(!storage.contains("userInfo"));
    }

    #[tokio::test]
    async fn persist_failure_is_reported() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        let vault = SessionVault::new(storage.clone());

        let action = persist(&vault, Operation::Login, session("t1"), |session| {
            SessionAction::LoggedIn { session }
        })
        .await;

        assert!(matches!(
            action,
            SessionAction::PersistFailed { operation: Operation::Login, .. }
        ));
        assert!(!storage.contains("userInfo"));
    }

    #[test]
    fn persist_failed_keeps_prior_session() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(SessionState {
                is_loading: true,
                ..logged_in("t1")
            })
            .when_action(SessionAction::PersistFailed {
                operation: Operation::Login,
                reason: "disk full".to_string(),
            })
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.token(), Some("t1"));
                let notice = state.notice.as_ref().unwrap();
                assert_eq!(notice.kind, NoticeKind::Failure);
                assert_eq!(notice.detail, "Could not save your session");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
