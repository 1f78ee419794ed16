//! # todo-sync
//!
//! To-do list client: keeps a signed-in user's session persisted locally and
//! a cache of their todos in step with a REST backend.
//!
//! Two stores make up the client:
//!
//! - [`SessionStore`]: register, login, logout and restore a persisted session
//! - [`TodoStore`]: fetch, create, toggle, update and delete todos
//!
//! Both are reducer-driven. Operations never return errors to the caller;
//! failures surface as a transient [`Notice`] on the store's state.
//!
//! # Quick Start
//!
//! ```no_run
//! use todo_sync::{ClientConfig, TodoApp};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let app = TodoApp::from_config(&config);
//! app.start().await;
//!
//! if app.session().login("ada@example.com", "hunter2").await {
//!     for todo in app.todos().fetch_all().await {
//!         println!("[{}] {}", if todo.is_completed { "x" } else { " " }, todo.name);
//!     }
//! }
//!
//! app.shutdown(config.shutdown_timeout).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod notice;
pub mod providers;
pub mod session;
pub mod stores;
pub mod todos;
pub mod types;
pub mod vault;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export commonly used types
pub use app::TodoApp;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, StorageError};
pub use http::HttpBackend;
pub use notice::{Notice, NoticeKind, Operation};
pub use providers::{KeyValueStorage, TodoBackend};
pub use session::{SessionAction, SessionState, SessionStore};
pub use stores::FileStorage;
pub use todos::{TodoAction, TodoState, TodoStore};
pub use types::{Password, Session, Todo, TodoFilter, TodoId, User};
pub use vault::SessionVault;
