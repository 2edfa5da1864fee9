//! Persistence Adapters
//!
//! Implementations of the store port: SQLite for deployments and an
//! in-memory store for tests and development.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::{InMemoryStore, InMemoryTx};
pub use sqlite::{SqliteStore, SqliteTx};
