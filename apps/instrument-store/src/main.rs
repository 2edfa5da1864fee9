//! Instrument Store Binary
//!
//! Starts the instrument store REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin instrument-store
//! ```
//!
//! # Environment Variables
//!
//! - `APP_CONFIG`: Configuration file (default: config.yaml; defaults apply when missing)
//! - `RUST_LOG`: Log filter, overriding `observability.logging.level`
//!
//! Any `${VAR}` referenced from the configuration file may also be set,
//! directly or through a `.env` file.

use anyhow::Context;
use instrument_store::Container;
use instrument_store::config::{Config, LogFormat, LoggingConfig, load_config};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = load_config(None).context("failed to load configuration")?;
    init_tracing(&config.observability.logging);

    tracing::info!("Starting Instrument Store");
    log_config(&config);

    let container = Container::build(&config)
        .await
        .context("failed to open the store")?;
    container
        .seed(&config)
        .await
        .context("failed to seed the store")?;

    let addr = config.server.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, backend = container.backend_name(), "HTTP server starting");

    axum::serve(listener, container.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    container.shutdown().await;
    tracing::info!("Instrument store stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise the configured level applies to this crate
/// and to request spans from `tower_http`.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging.level.to_lowercase();
        EnvFilter::new(format!("warn,instrument_store={level},tower_http={level}"))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(logging.include_spans)
            .with_span_list(logging.include_spans)
            .init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Log the parsed configuration.
fn log_config(config: &Config) {
    tracing::info!(
        http_port = config.server.http_port,
        bind_address = %config.server.bind_address,
        cors_origins = ?config.server.cors_origins,
        backend = ?config.persistence.backend,
        seed = config.seed.enabled,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; the process could not
/// otherwise be stopped cleanly.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    tracing::info!("Graceful shutdown started; draining open connections");
}
