//! Quantity value object for order lines and stock adjustments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A strictly positive unit count.
///
/// Used for order line quantities and for every stock adjustment; a zero or
/// negative adjustment is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Validate a raw count.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if `value` is not in `1..=u32::MAX`.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::invalid("quantity", "must be greater than zero"));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::invalid("quantity", "is too large"))
    }

    /// The inner count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
