//! In-memory provider implementations for testing.
//!
//! Enabled by the `test-utils` feature (on by default).

pub mod backend;
pub mod storage;

pub use backend::{Endpoint, MockBackend};
pub use storage::MemoryStorage;
