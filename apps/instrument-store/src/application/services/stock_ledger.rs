//! Stock Ledger
//!
//! Stock is one non-negative counter per instrument, changed only through
//! [`decrement`] and [`increment`]. Both run inside the caller's transaction
//! so they commit or roll back together with the rest of the workflow.

use crate::application::ports::StoreTx;
use crate::domain::shared::{InstrumentId, Quantity};
use crate::error::ServiceError;

pub(crate) fn instrument_not_found(id: &InstrumentId) -> ServiceError {
    ServiceError::not_found(format!("Instrument not found: {id}"))
}

/// Remove `quantity` units from stock and return the new stock.
///
/// The sufficiency check and the write are a single conditional update, so
/// concurrent orders cannot both consume the same units.
///
/// # Errors
///
/// - `Validation` if `quantity` is not positive
/// - `NotFound` if the instrument does not exist
/// - `InsufficientStock` if `quantity` exceeds the stock on hand; stock is
///   left unchanged
pub async fn decrement<T: StoreTx>(
    tx: &mut T,
    id: &InstrumentId,
    quantity: i64,
) -> Result<u32, ServiceError> {
    let quantity = Quantity::new(quantity)?;
    let instrument = tx
        .instrument(id)
        .await?
        .ok_or_else(|| instrument_not_found(id))?;

    tx.try_decrement_stock(id, quantity)
        .await?
        .ok_or_else(|| ServiceError::InsufficientStock {
            instrument: instrument.name().to_string(),
            available: instrument.stock(),
        })
}

/// Add `quantity` units to stock and return the new stock.
///
/// # Errors
///
/// - `Validation` if `quantity` is not positive
/// - `NotFound` if the instrument does not exist
/// - `Validation` if the new stock would not fit the counter
pub async fn increment<T: StoreTx>(
    tx: &mut T,
    id: &InstrumentId,
    quantity: i64,
) -> Result<u32, ServiceError> {
    let quantity = Quantity::new(quantity)?;
    let stock = current_stock(tx, id).await?;
    if stock.checked_add(quantity.get()).is_none() {
        return Err(ServiceError::validation("Stock would exceed the maximum"));
    }
    tx.increment_stock(id, quantity)
        .await?
        .ok_or_else(|| instrument_not_found(id))
}

/// Units on hand.
///
/// # Errors
///
/// Returns `NotFound` if the instrument does not exist.
pub async fn current_stock<T: StoreTx>(tx: &mut T, id: &InstrumentId) -> Result<u32, ServiceError> {
    tx.instrument(id)
        .await?
        .map(|instrument| instrument.stock())
        .ok_or_else(|| instrument_not_found(id))
}
