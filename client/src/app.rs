//! Application wiring.

use crate::config::ClientConfig;
use crate::http::HttpBackend;
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::session::{SessionEnvironment, SessionStore};
use crate::stores::FileStorage;
use crate::todos::{TodoEnvironment, TodoStore};
use crate::vault::SessionVault;
use std::sync::Arc;
use std::time::Duration;
use todo_sync_core::environment::{Clock, SystemClock};
use todo_sync_runtime::StoreError;

/// Both stores, built from one backend and one vault
///
/// Created once at application start and handed to the view layer; there
/// is no global instance.
pub struct TodoApp<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    session: SessionStore<B, K>,
    todos: TodoStore<B, K>,
}

impl<B, K> TodoApp<B, K>
where
    B: TodoBackend + Clone + 'static,
    K: KeyValueStorage + Clone + 'static,
{
    /// Wire both stores with the system clock
    #[must_use]
    pub fn new(backend: B, vault: SessionVault<K>) -> Self {
        Self::with_clock(backend, vault, Arc::new(SystemClock))
    }

    /// Wire both stores with an explicit clock
    #[must_use]
    pub fn with_clock(backend: B, vault: SessionVault<K>, clock: Arc<dyn Clock>) -> Self {
        let session = SessionStore::new(SessionEnvironment::new(
            backend.clone(),
            vault.clone(),
            Arc::clone(&clock),
        ));
        let todos = TodoStore::new(TodoEnvironment::new(backend, vault, clock));

        Self { session, todos }
    }

    /// Session Store
    #[must_use]
    pub const fn session(&self) -> &SessionStore<B, K> {
        &self.session
    }

    /// Todo Store
    #[must_use]
    pub const fn todos(&self) -> &TodoStore<B, K> {
        &self.todos
    }

    /// Restore the persisted session; call once at startup
    pub async fn start(&self) {
        self.session.restore_session().await;
    }

    /// Tear both stores down, waiting up to `timeout` for in-flight work
    ///
    /// # Errors
    ///
    /// Returns the first store's `StoreError::ShutdownTimeout` if work was
    /// still running when the timeout elapsed.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        let (session, todos) = futures::future::join(
            self.session.shutdown(timeout),
            self.todos.shutdown(timeout),
        )
        .await;
        session.and(todos)
    }
}

impl TodoApp<HttpBackend, FileStorage> {
    /// Production wiring: HTTP backend and file storage from `config`
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let backend = HttpBackend::from_config(config);
        let vault = SessionVault::with_key(
            FileStorage::new(config.storage_path.clone()),
            config.session_key.clone(),
        );

        tracing::debug!(
            api_url = %config.api_url,
            storage = %config.storage_path.display(),
            "Wiring todo app"
        );

        Self::new(backend, vault)
    }
}
