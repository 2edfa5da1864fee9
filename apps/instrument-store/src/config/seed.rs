//! Startup seeding configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Startup seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Seed empty tables on startup.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Instrument dataset to load instead of the bundled one.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dataset: None,
        }
    }
}

const fn default_enabled() -> bool {
    true
}
