//! Ordering Bounded Context
//!
//! Customer orders: an immutable set of lines plus an append-only status
//! history from which the current status is derived.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: header, lines and status events
//! - **Status history**: never rewritten; the newest event is the status
//! - **Frozen unit price**: each line keeps the price it was sold at

mod order;
mod status;

pub use order::{Order, OrderLine};
pub use status::{OrderStatus, StatusEvent};
