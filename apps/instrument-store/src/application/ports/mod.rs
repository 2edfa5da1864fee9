//! Application Ports
//!
//! Ports define interfaces for interacting with external systems.
//! The application drives a single port: the transactional store.

mod store_port;

pub use store_port::{Store, StoreError, StoreTx};
