//! Dependency Injection Container
//!
//! Builds the configured store and wires it into the HTTP router and the
//! startup seeder.

use std::sync::Arc;

use axum::Router;

use crate::application::ports::{Store, StoreError};
use crate::config::{Config, StoreBackend};
use crate::infrastructure::http::{AppState, create_router};
use crate::infrastructure::persistence::{InMemoryStore, SqliteStore};
use crate::infrastructure::seed::{SeedError, SeedReport, seed};

/// The store selected by configuration.
#[derive(Clone)]
pub enum StoreHandle {
    /// SQLite database.
    Sqlite(Arc<SqliteStore>),
    /// Process-local store.
    Memory(Arc<InMemoryStore>),
}

/// Dependency injection container.
///
/// Holds the store and the settings needed to build the router. Use
/// [`Container::build`] to open the configured backend.
pub struct Container {
    store: StoreHandle,
    cors_origins: Vec<String>,
    version: String,
}

impl Container {
    /// Open the configured store, running migrations for SQLite.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or migrated.
    pub async fn build(config: &Config) -> Result<Self, StoreError> {
        let store = match config.persistence.backend {
            StoreBackend::Sqlite => {
                StoreHandle::Sqlite(Arc::new(SqliteStore::connect(&config.persistence).await?))
            }
            StoreBackend::Memory => StoreHandle::Memory(Arc::new(InMemoryStore::new())),
        };
        Ok(Self::with_store(store, config))
    }

    /// Wrap an already opened store.
    #[must_use]
    pub fn with_store(store: StoreHandle, config: &Config) -> Self {
        Self {
            store,
            cors_origins: config.server.cors_origins.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Name of the active backend.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self.store {
            StoreHandle::Sqlite(_) => "sqlite",
            StoreHandle::Memory(_) => "memory",
        }
    }

    /// Seed empty tables.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the dataset or the store fails.
    pub async fn seed(&self, config: &Config) -> Result<SeedReport, SeedError> {
        match &self.store {
            StoreHandle::Sqlite(store) => seed(store.as_ref(), &config.seed).await,
            StoreHandle::Memory(store) => seed(store.as_ref(), &config.seed).await,
        }
    }

    /// HTTP router over the store.
    #[must_use]
    pub fn router(&self) -> Router {
        match &self.store {
            StoreHandle::Sqlite(store) => self.router_for(store),
            StoreHandle::Memory(store) => self.router_for(store),
        }
    }

    fn router_for<S: Store>(&self, store: &Arc<S>) -> Router {
        create_router(AppState::new(store, self.version.clone()), &self.cors_origins)
    }

    /// Release store resources.
    pub async fn shutdown(&self) {
        if let StoreHandle::Sqlite(store) = &self.store {
            store.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn memory_backend_seeds_and_serves() {
        let config = crate::config::load_config_from_string("persistence:\n  backend: memory\n").unwrap();
        let container = Container::build(&config).await.unwrap();
        assert_eq!(container.backend_name(), "memory");

        let report = container.seed(&config).await.unwrap();
        assert!(report.admin);

        let response = container
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/categorias")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        container.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_backend_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/nested/store.db", dir.path().display());
        let yaml = format!("persistence:\n  backend: sqlite\n  url: \"{url}\"\n");
        let config = crate::config::load_config_from_string(&yaml).unwrap();

        let container = Container::build(&config).await.unwrap();
        container.seed(&config).await.unwrap();
        container.shutdown().await;

        assert_eq!(container.backend_name(), "sqlite");
        assert!(dir.path().join("nested/store.db").exists());
    }
}
