//! State, actions and environment of the todo feature.

use crate::error::ApiError;
use crate::notice::{Notice, Operation};
use crate::providers::{KeyValueStorage, TodoBackend};
use crate::types::{Todo, TodoFilter, TodoId};
use crate::vault::SessionVault;
use std::sync::Arc;
use todo_sync_core::environment::Clock;

/// Local cache of the current user's todos
///
/// `todos` keeps server order. Fetches replace it wholesale; mutations patch
/// it from their own response.
#[derive(Clone, Debug, Default)]
pub struct TodoState {
    /// Cached todos
    pub todos: Vec<Todo>,
    /// Last failure reported to the user
    pub notice: Option<Notice>,
}

impl TodoState {
    /// Creates a state holding `todos`
    #[must_use]
    pub const fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            notice: None,
        }
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == *id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.is_completed).count()
    }

    /// Replace the entry with the same id, keeping its position
    ///
    /// Returns `false` (and changes nothing) if the id is not cached.
    pub fn replace(&mut self, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|existing| existing.id == todo.id) {
            Some(existing) => {
                *existing = todo;
                true
            },
            None => false,
        }
    }

    /// Remove the entry with `id`
    ///
    /// Returns `false` if the id is not cached.
    pub fn remove(&mut self, id: &TodoId) -> bool {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != *id);
        self.todos.len() != before
    }
}

/// Todo actions
#[derive(Clone, Debug, PartialEq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Replace the cache with the server's list
    Fetch {
        /// Which list
        filter: TodoFilter,
    },
    /// Refresh one cached todo
    FetchOne {
        /// Todo to refresh
        id: TodoId,
    },
    /// Create a todo
    Create {
        /// Name as typed; trimmed before sending
        name: String,
    },
    /// Flip a todo's completion flag on the server
    Toggle {
        /// Todo to flip
        id: TodoId,
    },
    /// Replace a todo's name and completion flag
    Update {
        /// Todo to change
        id: TodoId,
        /// New name; trimmed before sending
        name: String,
        /// New completion flag
        is_completed: bool,
    },
    /// Delete a todo
    Delete {
        /// Todo to delete
        id: TodoId,
    },
    /// Hide the current notice
    DismissNotice,

    // ========== Results ==========
    /// Server list arrived
    TodosLoaded {
        /// Requested list
        filter: TodoFilter,
        /// Server rows, in server order
        todos: Vec<Todo>,
    },
    /// A single refreshed row arrived
    TodoLoaded {
        /// Server row
        todo: Todo,
    },
    /// Server created the todo
    TodoCreated {
        /// Server row
        todo: Todo,
    },
    /// Server flipped the flag
    TodoToggled {
        /// Server row
        todo: Todo,
    },
    /// Server applied the update
    TodoUpdated {
        /// Server row
        todo: Todo,
    },
    /// Server deleted the todo
    TodoDeleted {
        /// Deleted todo
        id: TodoId,
    },
    /// A request failed
    RequestFailed {
        /// Which call failed
        operation: Operation,
        /// Why
        error: ApiError,
    },
    /// No persisted session; nothing was sent
    NoSession {
        /// Skipped call
        operation: Operation,
    },
}

/// Todo dependencies
#[derive(Clone)]
pub struct TodoEnvironment<B, K> {
    /// REST backend
    pub backend: B,
    /// Persisted session, read for the token on every call
    pub vault: SessionVault<K>,
    /// Clock for notice timestamps
    pub clock: Arc<dyn Clock>,
}

impl<B, K> TodoEnvironment<B, K>
where
    B: TodoBackend,
    K: KeyValueStorage,
{
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(backend: B, vault: SessionVault<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            vault,
            clock,
        }
    }
}
