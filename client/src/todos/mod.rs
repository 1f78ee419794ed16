//! Todo feature: keep a local cache of the user's todos in step with the
//! backend.
//!
//! [`TodoStore`] is what the view layer talks to. Operations never fail;
//! failures show up as a [`Notice`]. The store does not refresh itself after
//! a mutation: each one patches the cache from its own response, and callers
//! sequence dependent calls themselves.
//!
//! Concurrent mutations of the same item are not coordinated. Whichever
//! response is reduced last decides the cached state, except that a row for
//! an id that has since been deleted is dropped.

pub mod reducer;
pub mod types;

pub use reducer::{validated_name, TodoReducer};
pub use types::{TodoAction, TodoEnvironment, TodoState};

use crate::notice::Notice;
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::types::{Todo, TodoFilter, TodoId};
use std::sync::Arc;
use std::time::Duration;
use todo_sync_core::environment::Clock;
use todo_sync_runtime::{Store, StoreError};
use tokio::sync::broadcast;

/// Runtime store specialised for the todo feature
type TodoRuntime<B, K> = Store<TodoState, TodoAction, TodoEnvironment<B, K>, TodoReducer<B, K>>;

/// Todo Store
///
/// Exclusively owns the in-memory todo collection.
pub struct TodoStore<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    store: TodoRuntime<B, K>,
    clock: Arc<dyn Clock>,
}

impl<B, K> TodoStore<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    /// Create a store with an empty cache
    #[must_use]
    pub fn new(environment: TodoEnvironment<B, K>) -> Self {
        let clock = Arc::clone(&environment.clock);
        Self {
            store: Store::new(TodoState::default(), TodoReducer::new(), environment),
            clock,
        }
    }

    /// Replace the cache with all of the user's todos
    ///
    /// # Returns
    ///
    /// The fetched list, taken from the server response rather than read
    /// back from the cache. Empty without a session or on failure.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_all(&self) -> Vec<Todo> {
        self.fetch(TodoFilter::All).await
    }

    /// Replace the cache with the user's completed todos
    #[tracing::instrument(skip(self))]
    pub async fn fetch_completed(&self) -> Vec<Todo> {
        self.fetch(TodoFilter::Completed).await
    }

    /// Replace the cache with the user's open todos
    #[tracing::instrument(skip(self))]
    pub async fn fetch_incomplete(&self) -> Vec<Todo> {
        self.fetch(TodoFilter::Incomplete).await
    }

    /// Refresh one cached todo in place. Unknown ids are ignored.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn fetch_one(&self, id: &TodoId) {
        self.dispatch(TodoAction::FetchOne { id: id.clone() }).await;
    }

    /// Create a todo and append the server's row
    ///
    /// A name that is blank after trimming raises a validation notice and
    /// sends nothing.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, name: &str) {
        self.dispatch(TodoAction::Create {
            name: name.to_string(),
        })
        .await;
    }

    /// Ask the server to flip the todo's completion flag, then cache the
    /// server's row. Unknown ids are ignored.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn toggle(&self, id: &TodoId) {
        self.dispatch(TodoAction::Toggle { id: id.clone() }).await;
    }

    /// Replace name and completion flag, then cache the server's row
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn update(&self, id: &TodoId, name: &str, is_completed: bool) {
        self.dispatch(TodoAction::Update {
            id: id.clone(),
            name: name.to_string(),
            is_completed,
        })
        .await;
    }

    /// Delete on the server, then drop the cached entry
    ///
    /// If the server call fails the cache is left as it was.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub async fn delete(&self, id: &TodoId) {
        self.dispatch(TodoAction::Delete { id: id.clone() }).await;
    }

    /// Hide the current notice
    pub async fn dismiss_notice(&self) {
        self.dispatch(TodoAction::DismissNotice).await;
    }

    /// Cached todos, in server order
    pub async fn todos(&self) -> Vec<Todo> {
        self.store.state(|s| s.todos.clone()).await
    }

    /// Cached todo by id
    pub async fn get(&self, id: &TodoId) -> Option<Todo> {
        self.store.state(|s| s.get(id).cloned()).await
    }

    /// Number of cached completed todos
    pub async fn completed_count(&self) -> usize {
        self.store.state(TodoState::completed_count).await
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
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Stream of result actions, for views that react to changes
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting operations and wait for in-flight ones
    ///
    /// Results arriving afterwards are dropped, so the cache never changes
    /// after teardown.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShutdownTimeout` if operations are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn fetch(&self, filter: TodoFilter) -> Vec<Todo> {
        self.dispatch(TodoAction::Fetch { filter })
            .await
            .into_iter()
            .find_map(|action| match action {
                TodoAction::TodosLoaded { filter: loaded, todos } if loaded == filter => Some(todos),
                _ => None,
            })
            .unwrap_or_default()
    }

    async fn dispatch(&self, action: TodoAction) -> Vec<TodoAction> {
        match self.store.send_and_collect(action).await {
            Ok(produced) => produced,
            Err(error) => {
                tracing::warn!(%error, "Todo store rejected action");
                Vec::new()
            },
        }
    }
}
