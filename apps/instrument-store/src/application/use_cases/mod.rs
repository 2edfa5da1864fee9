//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.
//! Each one holds the store behind an `Arc` and opens one transaction per
//! operation.

mod manage_catalog;
mod manage_categories;
mod order_workflow;
mod query_orders;
mod user_accounts;

pub use manage_catalog::ManageCatalogUseCase;
pub use manage_categories::ManageCategoriesUseCase;
pub use order_workflow::OrderWorkflowUseCase;
pub use query_orders::QueryOrdersUseCase;
pub use user_accounts::{Caller, UserAccountsUseCase};
