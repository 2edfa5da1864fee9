//! Infrastructure Layer
//!
//! This module contains all adapters (implementations) for the ports defined
//! in the application layer. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement ports for external systems
//!   - `persistence/`: Store adapters (SQLite, in-memory)
//!
//! - **Driver Adapters (Inbound)**: Expose application to external world
//!   - `http/`: REST API controllers and the authorization middleware
//!
//! - **Startup**
//!   - `seed`: Idempotent seeding of roles, admin, categories and instruments
//!   - `config/`: Dependency injection container

pub mod config;
pub mod http;
pub mod persistence;
pub mod seed;
