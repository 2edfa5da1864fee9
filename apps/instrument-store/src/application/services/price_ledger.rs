//! Price Ledger
//!
//! Append-only price history per instrument. Entries are never updated or
//! removed; the current price is the newest entry by timestamp, ties going
//! to the most recent insertion, and zero when there is no history.

use rust_decimal::Decimal;

use crate::application::ports::StoreTx;
use crate::domain::catalog::PriceEntry;
use crate::domain::shared::{InstrumentId, Money, Timestamp};
use crate::error::ServiceError;

/// Append a new price for an instrument, stamped now.
///
/// # Errors
///
/// Returns `Validation` if `price` is not positive or the instrument does
/// not exist.
pub async fn record_price<T: StoreTx>(
    tx: &mut T,
    id: &InstrumentId,
    price: Decimal,
) -> Result<PriceEntry, ServiceError> {
    record_price_at(tx, id, price, Timestamp::now()).await
}

/// Append a price with an explicit timestamp.
///
/// # Errors
///
/// Same as [`record_price`].
pub async fn record_price_at<T: StoreTx>(
    tx: &mut T,
    id: &InstrumentId,
    price: Decimal,
    recorded_at: Timestamp,
) -> Result<PriceEntry, ServiceError> {
    let price = Money::price(price)?;
    if tx.instrument(id).await?.is_none() {
        return Err(ServiceError::validation(format!(
            "Instrument not found: {id}"
        )));
    }
    Ok(tx.append_price(id, price, recorded_at).await?)
}

/// Current price of an instrument; zero when it has no history.
///
/// # Errors
///
/// Only store failures.
pub async fn current_price<T: StoreTx>(tx: &mut T, id: &InstrumentId) -> Result<Money, ServiceError> {
    Ok(tx
        .latest_price(id)
        .await?
        .map_or(Money::ZERO, |entry| entry.price()))
}

/// Full history of an instrument, newest first.
///
/// # Errors
///
/// Only store failures.
pub async fn price_history<T: StoreTx>(
    tx: &mut T,
    id: &InstrumentId,
) -> Result<Vec<PriceEntry>, ServiceError> {
    Ok(tx.price_history(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Store;
    use crate::application::test_support::{DRUM, GUITAR, fixture};
    use crate::error::ErrorCode;
    use chrono::Duration;

    fn shifted(base: Timestamp, secs: i64) -> Timestamp {
        Timestamp::new(base.as_datetime() + Duration::seconds(secs))
    }

    #[tokio::test]
    async fn recorded_price_is_current_immediately() {
        let store = fixture().await;
        let mut tx = store.begin().await.unwrap();
        let id = InstrumentId::new(GUITAR);

        record_price(&mut tx, &id, Decimal::new(12_345, 2)).await.unwrap();

        assert_eq!(current_price(&mut tx, &id).await.unwrap(), Money::from_cents(12_345));
    }

    #[tokio::test]
    async fn latest_timestamp_wins_over_insertion_order() {
        let store = fixture().await;
        let mut tx = store.begin().await.unwrap();
        let id = InstrumentId::new(DRUM);
        let base = Timestamp::now();

        record_price_at(&mut tx, &id, Decimal::new(300, 0), shifted(base, 300)).await.unwrap();
        record_price_at(&mut tx, &id, Decimal::new(100, 0), shifted(base, 100)).await.unwrap();
        record_price_at(&mut tx, &id, Decimal::new(200, 0), shifted(base, 200)).await.unwrap();

        assert_eq!(current_price(&mut tx, &id).await.unwrap(), Money::new(Decimal::new(300, 0)));
    }

    #[tokio::test]
    async fn timestamp_tie_goes_to_latest_insertion() {
        let store = fixture().await;
        let mut tx = store.begin().await.unwrap();
        let id = InstrumentId::new(DRUM);
        let at = shifted(Timestamp::now(), 60);

        record_price_at(&mut tx, &id, Decimal::new(10, 0), at).await.unwrap();
        record_price_at(&mut tx, &id, Decimal::new(20, 0), at).await.unwrap();

        assert_eq!(current_price(&mut tx, &id).await.unwrap(), Money::new(Decimal::new(20, 0)));
    }

    #[tokio::test]
    async fn history_is_append_only_and_newest_first() {
        let store = fixture().await;
        let mut tx = store.begin().await.unwrap();
        let id = InstrumentId::new(GUITAR);
        let before = price_history(&mut tx, &id).await.unwrap();

        record_price(&mut tx, &id, Decimal::new(1, 0)).await.unwrap();
        let after = price_history(&mut tx, &id).await.unwrap();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0].price(), Money::new(Decimal::new(1, 0)));
        assert_eq!(&after[1..], before.as_slice());
    }

    #[tokio::test]
    async fn no_history_means_zero() {
        let store = fixture().await;
        let mut tx = store.read().await.unwrap();
        assert_eq!(
            current_price(&mut tx, &InstrumentId::new("ghost")).await.unwrap(),
            Money::ZERO
        );
    }

    #[tokio::test]
    async fn invalid_price_or_instrument_is_validation() {
        let store = fixture().await;
        let mut tx = store.begin().await.unwrap();

        let zero = record_price(&mut tx, &InstrumentId::new(GUITAR), Decimal::ZERO).await;
        let ghost = record_price(&mut tx, &InstrumentId::new("ghost"), Decimal::ONE).await;

        assert_eq!(zero.unwrap_err().code(), ErrorCode::Validation);
        assert_eq!(ghost.unwrap_err().code(), ErrorCode::Validation);
    }
}
