//! Price history entries.
//!
//! Prices are never stored on the instrument itself. Every price change
//! appends a [`PriceEntry`]; the current price is whatever entry is latest
//! by `(recorded_at, sequence)`.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{InstrumentId, Money, Timestamp};

/// One immutable entry in an instrument's price history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    instrument_id: InstrumentId,
    price: Money,
    recorded_at: Timestamp,
    sequence: i64,
}

impl PriceEntry {
    /// Build an entry. `sequence` is the store-assigned insertion order.
    #[must_use]
    pub const fn new(
        instrument_id: InstrumentId,
        price: Money,
        recorded_at: Timestamp,
        sequence: i64,
    ) -> Self {
        Self {
            instrument_id,
            price,
            recorded_at,
            sequence,
        }
    }

    /// Instrument this entry belongs to.
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Recorded price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// When the price was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }

    /// Insertion sequence; breaks timestamp ties.
    #[must_use]
    pub const fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Ordering key: later timestamp wins, then later insertion.
    #[must_use]
    pub const fn recency(&self) -> (Timestamp, i64) {
        (self.recorded_at, self.sequence)
    }
}

/// Current price of an instrument given its history. Zero when empty.
pub fn current_price<'a, I>(entries: I) -> Money
where
    I: IntoIterator<Item = &'a PriceEntry>,
{
    entries
        .into_iter()
        .max_by_key(|entry| entry.recency())
        .map_or(Money::ZERO, PriceEntry::price)
}
