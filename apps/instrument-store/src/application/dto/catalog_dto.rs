//! Catalog DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Category, Instrument, PriceEntry};
use crate::domain::shared::{Money, Timestamp};

/// DTO for creating an instrument with its initial price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstrumentDto {
    /// Catalog code, unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Initial stock.
    pub stock: i64,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Image reference.
    #[serde(default)]
    pub image: String,
    /// Initial price; becomes the first price history entry.
    pub price: Decimal,
    /// Owning category.
    pub category_id: String,
}

/// DTO for a partial instrument update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstrumentDto {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New brand.
    pub brand: Option<String>,
    /// Stock overwrite.
    pub stock: Option<i64>,
    /// New description.
    pub description: Option<String>,
    /// New image.
    pub image: Option<String>,
    /// New price; appended to the history when it differs from the current one.
    pub price: Option<Decimal>,
    /// New category.
    pub category_id: Option<String>,
}

/// DTO for a price change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPriceDto {
    /// New price.
    pub price: Decimal,
}

/// DTO for a stock replenishment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishStockDto {
    /// Units to add.
    pub quantity: i64,
}

/// DTO representing an instrument with its derived current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDto {
    /// Instrument ID.
    pub id: String,
    /// Catalog code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Units on hand.
    pub stock: u32,
    /// Description.
    pub description: String,
    /// Image reference.
    pub image: String,
    /// Current price from the price history.
    pub current_price: Money,
    /// Category ID.
    pub category_id: String,
    /// Category name, when resolvable.
    pub category: Option<String>,
}

impl InstrumentDto {
    /// Build from the entity plus derived values.
    #[must_use]
    pub fn new(instrument: &Instrument, current_price: Money, category: Option<String>) -> Self {
        Self {
            id: instrument.id().to_string(),
            code: instrument.code().to_string(),
            name: instrument.name().to_string(),
            brand: instrument.brand().to_string(),
            stock: instrument.stock(),
            description: instrument.description().to_string(),
            image: instrument.image().to_string(),
            current_price,
            category_id: instrument.category_id().to_string(),
            category,
        }
    }
}

/// DTO representing one price history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntryDto {
    /// Price.
    pub price: Money,
    /// When it was recorded.
    pub recorded_at: Timestamp,
}

impl From<&PriceEntry> for PriceEntryDto {
    fn from(entry: &PriceEntry) -> Self {
        Self {
            price: entry.price(),
            recorded_at: entry.recorded_at(),
        }
    }
}

/// DTO for stock changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDto {
    /// Instrument ID.
    pub instrument_id: String,
    /// Units on hand after the change.
    pub stock: u32,
}

/// DTO for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequestDto {
    /// Category name.
    pub name: String,
}

/// DTO representing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDto {
    /// Category ID.
    pub id: String,
    /// Category name.
    pub name: String,
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id().to_string(),
            name: category.name().to_string(),
        }
    }
}
