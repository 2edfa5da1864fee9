//! Domain Layer
//!
//! The innermost layer containing business rules with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Entities and Aggregates**: instruments, categories, orders, users
//! - **Value Objects**: identifiers, money, quantities, timestamps, status labels
//! - **Derived reads**: current price and current status from append-only histories
//!
//! # Bounded Contexts
//!
//! - [`catalog`]: Instruments, categories and price history
//! - [`ordering`]: Orders, lines and status history
//! - [`identity`]: Users, roles and capabilities

pub mod catalog;
pub mod identity;
pub mod ordering;
pub mod shared;
