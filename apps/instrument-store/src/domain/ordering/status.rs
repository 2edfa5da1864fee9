//! Order status labels and status events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{DomainError, Timestamp};

/// A status label.
///
/// Labels are free-form and case-sensitive. Only [`OrderStatus::CANCELLED`]
/// carries a side effect (stock restoration), and only
/// [`OrderStatus::PENDING`] permits deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Initial status of every order.
    pub const PENDING: &'static str = "PENDING";
    /// Order accepted by the store.
    pub const CONFIRMED: &'static str = "CONFIRMED";
    /// Order handed to the carrier.
    pub const SHIPPED: &'static str = "SHIPPED";
    /// Order received by the customer.
    pub const DELIVERED: &'static str = "DELIVERED";
    /// Order cancelled; entering it restores stock.
    pub const CANCELLED: &'static str = "CANCELLED";

    /// Validate a label.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if the label is blank.
    pub fn new(label: impl Into<String>) -> Result<Self, DomainError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DomainError::invalid("status", "status is required"));
        }
        Ok(Self(label))
    }

    /// The `PENDING` status.
    #[must_use]
    pub fn pending() -> Self {
        Self(Self::PENDING.to_string())
    }

    /// The `CANCELLED` status.
    #[must_use]
    pub fn cancelled() -> Self {
        Self(Self::CANCELLED.to_string())
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for exactly `PENDING`.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0 == Self::PENDING
    }

    /// True for exactly `CANCELLED`.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0 == Self::CANCELLED
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    status: OrderStatus,
    recorded_at: Timestamp,
    sequence: i64,
}

impl StatusEvent {
    /// Build an event. `sequence` is the store-assigned insertion order.
    #[must_use]
    pub const fn new(status: OrderStatus, recorded_at: Timestamp, sequence: i64) -> Self {
        Self {
            status,
            recorded_at,
            sequence,
        }
    }

    /// Status label.
    #[must_use]
    pub const fn status(&self) -> &OrderStatus {
        &self.status
    }

    /// When the status was recorded.
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
