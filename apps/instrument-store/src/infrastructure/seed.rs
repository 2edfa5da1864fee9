//! Startup seeding.
//!
//! Each table group is seeded only while it is empty, so running the seeder
//! on every start is safe:
//!
//! - roles
//! - the administrator account, when there are no users
//! - the five standard categories
//! - sample instruments from a JSON dataset, each with an initial price

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ports::{Store, StoreError, StoreTx};
use crate::config::SeedConfig;
use crate::domain::catalog::{Category, Instrument, InstrumentDraft};
use crate::domain::identity::{Role, User, UserRegistration};
use crate::domain::shared::{CategoryId, DomainError, InstrumentId, Money, Timestamp, UserId};

/// Login of the seeded administrator.
pub const ADMIN_EMAIL: &str = "admin@instrumentos.com";

const ADMIN_PASSWORD: &str = "admin123";

/// Seeded category names.
pub const CATEGORIES: [&str; 5] = ["Cuerda", "Viento", "Percusión", "Teclado", "Varios"];

const FALLBACK_CATEGORY: &str = "Varios";

const BUNDLED_DATASET: &str = include_str!("../../data/instruments.json");

/// Seeding errors.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The dataset file could not be read.
    #[error("Failed to read dataset '{path}': {source}")]
    Read {
        /// Dataset path.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The dataset is not valid JSON of the expected shape.
    #[error("Invalid dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// A seeded entity failed validation.
    #[error("Invalid seed data: {0}")]
    Domain(#[from] DomainError),

    /// The store rejected a write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rows inserted by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Roles inserted.
    pub roles: usize,
    /// Whether the administrator was created.
    pub admin: bool,
    /// Categories inserted.
    pub categories: usize,
    /// Instruments inserted.
    pub instruments: usize,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    instrumentos: Vec<DatasetInstrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetInstrument {
    #[serde(default)]
    id: Option<Value>,
    instrumento: String,
    marca: String,
    #[serde(default)]
    imagen: String,
    precio: Value,
    #[serde(default)]
    cantidad_vendida: Option<Value>,
    #[serde(default)]
    descripcion: String,
}

/// Seed the store according to `config`.
///
/// # Errors
///
/// Returns `SeedError` when the dataset cannot be loaded or the store fails.
/// Nothing is written on error.
pub async fn seed<S: Store>(store: &S, config: &SeedConfig) -> Result<SeedReport, SeedError> {
    if !config.enabled {
        info!("Seeding disabled");
        return Ok(SeedReport::default());
    }

    let dataset = match &config.dataset {
        Some(path) => read_dataset(path).await?,
        None => serde_json::from_str(BUNDLED_DATASET)?,
    };

    let mut tx = store.begin().await?;
    let report = SeedReport {
        roles: seed_roles(&mut tx).await?,
        admin: seed_admin(&mut tx).await?,
        categories: seed_categories(&mut tx).await?,
        instruments: seed_instruments(&mut tx, &dataset).await?,
    };
    tx.commit().await?;

    info!(
        roles = report.roles,
        admin = report.admin,
        categories = report.categories,
        instruments = report.instruments,
        "Seeding finished"
    );
    Ok(report)
}

async fn read_dataset(path: &Path) -> Result<Dataset, SeedError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    Ok(serde_json::from_str(&contents)?)
}

async fn seed_roles<T: StoreTx>(tx: &mut T) -> Result<usize, SeedError> {
    if !tx.roles().await?.is_empty() {
        return Ok(0);
    }
    for role in Role::ALL {
        tx.insert_role(role).await?;
    }
    Ok(Role::ALL.len())
}

async fn seed_admin<T: StoreTx>(tx: &mut T) -> Result<bool, SeedError> {
    if !tx.users().await?.is_empty() {
        return Ok(false);
    }
    let admin = User::register(
        UserId::generate(),
        UserRegistration {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            first_name: Some("Administrador".to_string()),
            last_name: Some("Sistema".to_string()),
            role: Role::Admin,
        },
    )?;
    tx.insert_user(&admin).await?;
    info!(email = ADMIN_EMAIL, "Administrator account created");
    Ok(true)
}

async fn seed_categories<T: StoreTx>(tx: &mut T) -> Result<usize, SeedError> {
    if !tx.categories().await?.is_empty() {
        return Ok(0);
    }
    for name in CATEGORIES {
        tx.insert_category(&Category::create(CategoryId::generate(), name)?)
            .await?;
    }
    Ok(CATEGORIES.len())
}

async fn seed_instruments<T: StoreTx>(tx: &mut T, dataset: &Dataset) -> Result<usize, SeedError> {
    if !tx.instruments(None).await?.is_empty() {
        info!("Instruments already loaded");
        return Ok(0);
    }

    let now = Timestamp::now();
    let mut inserted = 0;
    for (index, entry) in dataset.instrumentos.iter().enumerate() {
        let source_id = entry
            .id
            .as_ref()
            .map_or_else(|| (index + 1).to_string(), scalar_text);
        let Some(category) = tx.category_by_name(infer_category(&entry.instrumento)).await? else {
            warn!(source_id = %source_id, name = %entry.instrumento, "No matching category; skipped");
            continue;
        };
        let Some(price) = scalar_text(&entry.precio)
            .parse::<Decimal>()
            .ok()
            .and_then(|price| Money::price(price).ok())
        else {
            warn!(source_id = %source_id, price = %entry.precio, "Invalid price; skipped");
            continue;
        };
        let stock = entry
            .cantidad_vendida
            .as_ref()
            .and_then(|value| scalar_text(value).parse::<u32>().ok())
            .unwrap_or(0);

        let draft = InstrumentDraft {
            code: format!("INST-{source_id}"),
            name: entry.instrumento.clone(),
            brand: entry.marca.clone(),
            stock,
            description: entry.descripcion.clone(),
            image: entry.imagen.clone(),
            category_id: category.id().clone(),
        };
        let instrument = match Instrument::create(InstrumentId::generate(), draft) {
            Ok(instrument) => instrument,
            Err(err) => {
                warn!(source_id = %source_id, error = %err, "Invalid instrument; skipped");
                continue;
            }
        };
        tx.insert_instrument(&instrument).await?;
        tx.append_price(instrument.id(), price, now).await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Category name for an instrument, inferred from keywords in its name.
#[must_use]
pub fn infer_category(name: &str) -> &'static str {
    const RULES: [(&[&str], &str); 4] = [
        (&["guitarra", "mandolina", "violin", "violín"], "Cuerda"),
        (&["flauta", "saxo", "trompeta"], "Viento"),
        (
            &["batería", "bateria", "percusión", "percusion", "pandereta", "triangulo", "triángulo"],
            "Percusión",
        ),
        (&["piano", "teclado", "organo", "órgano"], "Teclado"),
    ];

    let name = name.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map_or(FALLBACK_CATEGORY, |(_, category)| *category)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}
