//! Reducer logic for the todo feature.
//!
//! Every networked command reads the token from the vault once, inside its
//! effect. Without a persisted session the effect reports `NoSession` and
//! sends nothing. Results patch the cache from the server's row; nothing is
//! changed optimistically.

use crate::error::ApiError;
use crate::notice::{Notice, Operation};
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::todos::types::{TodoAction, TodoEnvironment, TodoState};
use crate::vault::SessionVault;
use std::future::Future;
use todo_sync_core::{async_effect, effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// Trimmed name, or `None` if nothing is left after trimming
#[must_use]
pub fn validated_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Effect that runs `call` with the persisted token
fn authorized<K, F, Fut>(vault: SessionVault<K>, operation: Operation, call: F) -> Effect<TodoAction>
where
    K: KeyValueStorage + 'static,
    F: FnOnce(String) -> Fut + Send + 'static,
    Fut: Future<Output = TodoAction> + Send + 'static,
{
    async_effect! {
        let Some(token) = vault.token().await else {
            tracing::debug!(%operation, "No persisted session, skipping request");
            return Some(TodoAction::NoSession { operation });
        };
        Some(call(token).await)
    }
}

/// Map a backend result to the success action or `RequestFailed`
fn settle<T>(
    operation: Operation,
    result: Result<T, ApiError>,
    on_success: impl FnOnce(T) -> TodoAction,
) -> TodoAction {
    match result {
        Ok(value) => on_success(value),
        Err(error) => TodoAction::RequestFailed { operation, error },
    }
}

/// Reducer for the todo feature
#[derive(Debug, Clone)]
pub struct TodoReducer<B, K> {
    /// Phantom data to hold type parameters.
    _phantom: std::marker::PhantomData<(B, K)>,
}

impl<B, K> TodoReducer<B, K> {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<B, K> Default for TodoReducer<B, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, K> Reducer for TodoReducer<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment<B, K>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TodoAction::Fetch { filter } => {
                let operation = Operation::Fetch(filter);

                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), operation, move |token| async move {
                    settle(operation, backend.fetch_todos(&token, filter).await, |todos| {
                        TodoAction::TodosLoaded { filter, todos }
                    })
                })]
            },

            TodoAction::FetchOne { id } => {
                if !state.exists(&id) {
                    tracing::debug!(%id, "Not cached, skipping refresh");
                    return smallvec![Effect::None];
                }

                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), Operation::FetchOne, move |token| async move {
                    settle(Operation::FetchOne, backend.fetch_todo(&token, &id).await, |todo| {
                        TodoAction::TodoLoaded { todo }
                    })
                })]
            },

            TodoAction::Create { name } => {
                let Some(name) = validated_name(&name) else {
                    state.notice = Some(Notice::empty_name(env.clock.now()));
                    return smallvec![Effect::None];
                };

                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), Operation::Create, move |token| async move {
                    settle(Operation::Create, backend.create_todo(&token, &name).await, |todo| {
                        TodoAction::TodoCreated { todo }
                    })
                })]
            },

            TodoAction::Toggle { id } => {
                let Some(todo) = state.get(&id) else {
                    tracing::debug!(%id, "Not cached, ignoring toggle");
                    return smallvec![Effect::None];
                };
                let is_completed = !todo.is_completed;

                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), Operation::Toggle, move |token| async move {
                    settle(
                        Operation::Toggle,
                        backend.toggle_todo(&token, &id, is_completed).await,
                        |todo| TodoAction::TodoToggled { todo },
                    )
                })]
            },

            TodoAction::Update {
                id,
                name,
                is_completed,
            } => {
                let Some(name) = validated_name(&name) else {
                    state.notice = Some(Notice::empty_name(env.clock.now()));
                    return smallvec![Effect::None];
                };

                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), Operation::Update, move |token| async move {
                    settle(
                        Operation::Update,
                        backend.update_todo(&token, &id, &name, is_completed).await,
                        |todo| TodoAction::TodoUpdated { todo },
                    )
                })]
            },

            TodoAction::Delete { id } => {
                let backend = env.backend.clone();
                smallvec![authorized(env.vault.clone(), Operation::Delete, move |token| async move {
                    let result = backend.delete_todo(&token, &id).await;
                    settle(Operation::Delete, result, |()| TodoAction::TodoDeleted { id })
                })]
            },

            TodoAction::DismissNotice => {
                state.notice = None;
                smallvec![Effect::None]
            },

            // ========== Results ==========
            TodoAction::TodosLoaded { filter, todos } => {
                tracing::info!(?filter, count = todos.len(), "Todos loaded");
                state.todos = todos;
                smallvec![Effect::None]
            },

            TodoAction::TodoCreated { todo } => {
                tracing::info!(id = %todo.id, "Todo created");
                state.todos.push(todo);
                smallvec![Effect::None]
            },

            TodoAction::TodoLoaded { todo }
            | TodoAction::TodoToggled { todo }
            | TodoAction::TodoUpdated { todo } => {
                let id = todo.id.clone();
                if state.replace(todo) {
                    tracing::info!(%id, "Todo refreshed from server");
                } else {
                    // Deleted while the request was in flight
                    tracing::debug!(%id, "Todo no longer cached, dropping server row");
                }
                smallvec![Effect::None]
            },

            TodoAction::TodoDeleted { id } => {
                tracing::info!(%id, "Todo deleted");
                state.remove(&id);
                smallvec![Effect::None]
            },

            TodoAction::RequestFailed { operation, error } => {
                tracing::warn!(%operation, %error, "Todo request failed");
                state.notice = Some(Notice::from_api_error(operation, &error, env.clock.now()));
                smallvec![Effect::None]
            },

            TodoAction::NoSession { operation } => {
                tracing::debug!(%operation, "Skipped without session");
                smallvec![Effect::None]
            },
        }
    }
}
