//! Provider traits for external collaborators.
//!
//! The reducers only see these traits. Production implementations are
//! [`HttpBackend`](crate::http::HttpBackend) and
//! [`FileStorage`](crate::stores::FileStorage); in-memory ones live in
//! [`crate::mocks`].

pub mod backend;
pub mod storage;

pub use backend::TodoBackend;
pub use storage::KeyValueStorage;
