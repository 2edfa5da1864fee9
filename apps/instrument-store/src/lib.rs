// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Instrument Store - Core Library
//!
//! Backend of a musical instrument store: catalog, append-only price history,
//! stock ledger, user accounts with roles, and an order workflow whose status
//! history is an append-only log.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Entities and value objects with no I/O
//!   - `catalog`: Instruments, categories, price entries
//!   - `ordering`: Order aggregate, lines, status events
//!   - `identity`: Users, roles, capabilities, password digests
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: The transactional `Store` every use case runs against
//!   - `services`: Stock and price ledgers
//!   - `use_cases`: Order workflow, order queries, catalog, categories, accounts
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: SQLite and in-memory stores
//!   - `http`: REST API and authorization middleware
//!   - `seed`: Startup seeding
//!   - `config`: Dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Configuration loading.
pub mod config;

/// Errors surfaced by use cases.
pub mod error;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::catalog::{Category, Instrument, PriceEntry};
pub use domain::identity::{Capability, Role, User};
pub use domain::ordering::{Order, OrderLine, OrderStatus, StatusEvent};
pub use domain::shared::{CategoryId, InstrumentId, Money, OrderId, Quantity, Timestamp, UserId};

// Application re-exports
pub use application::ports::{Store, StoreError, StoreTx};
pub use application::use_cases::{
    Caller, ManageCatalogUseCase, ManageCategoriesUseCase, OrderWorkflowUseCase,
    QueryOrdersUseCase, UserAccountsUseCase,
};
pub use error::{ErrorCode, ServiceError};

// Infrastructure re-exports
pub use infrastructure::config::Container;
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::{InMemoryStore, SqliteStore};
