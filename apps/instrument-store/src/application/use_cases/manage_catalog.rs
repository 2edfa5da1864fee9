//! Manage Catalog Use Case
//!
//! Instrument CRUD plus the price and stock endpoints. Reads attach the
//! current price from the price ledger; writes that change the price append
//! to the history instead of overwriting anything.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::application::dto::{
    CreateInstrumentDto, InstrumentDto, PriceEntryDto, StockDto, UpdateInstrumentDto,
};
use crate::application::ports::{Store, StoreTx};
use crate::application::services::stock_ledger::instrument_not_found;
use crate::application::services::{price_ledger, stock_ledger};
use crate::domain::catalog::{Instrument, InstrumentDraft, InstrumentPatch};
use crate::domain::shared::{CategoryId, InstrumentId, Money};
use crate::error::ServiceError;

fn stock_count(stock: i64) -> Result<u32, ServiceError> {
    u32::try_from(stock)
        .map_err(|_| ServiceError::validation(format!("Invalid stock: {stock}")))
}

/// Use case for the instrument catalog.
pub struct ManageCatalogUseCase<S>
where
    S: Store,
{
    store: Arc<S>,
}

impl<S> ManageCatalogUseCase<S>
where
    S: Store,
{
    /// Create a new `ManageCatalogUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Instruments ordered by name, optionally within one category.
    ///
    /// # Errors
    ///
    /// Returns `Internal` on store failure.
    pub async fn list(&self, category: Option<&CategoryId>) -> Result<Vec<InstrumentDto>, ServiceError> {
        let mut tx = self.store.read().await?;
        let instruments = tx.instruments(category).await?;
        let mut dtos = Vec::with_capacity(instruments.len());
        for instrument in &instruments {
            dtos.push(describe(&mut tx, instrument).await?);
        }
        Ok(dtos)
    }

    /// One instrument with its current price and category name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown instrument.
    pub async fn get(&self, id: &InstrumentId) -> Result<InstrumentDto, ServiceError> {
        let mut tx = self.store.read().await?;
        let instrument = tx
            .instrument(id)
            .await?
            .ok_or_else(|| instrument_not_found(id))?;
        describe(&mut tx, &instrument).await
    }

    /// Price history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown instrument.
    pub async fn price_history(&self, id: &InstrumentId) -> Result<Vec<PriceEntryDto>, ServiceError> {
        let mut tx = self.store.read().await?;
        if tx.instrument(id).await?.is_none() {
            return Err(instrument_not_found(id));
        }
        let history = price_ledger::price_history(&mut tx, id).await?;
        Ok(history.iter().map(PriceEntryDto::from).collect())
    }

    /// Create an instrument and its first price entry.
    ///
    /// # Errors
    ///
    /// - `Validation` for invalid fields, a non-positive price, negative
    ///   stock or a duplicate code
    /// - `NotFound` for an unknown category
    pub async fn create(&self, request: CreateInstrumentDto) -> Result<InstrumentDto, ServiceError> {
        let price = Money::price(request.price)?;
        let instrument = Instrument::create(
            InstrumentId::generate(),
            InstrumentDraft {
                code: request.code,
                name: request.name,
                brand: request.brand,
                stock: stock_count(request.stock)?,
                description: request.description,
                image: request.image,
                category_id: CategoryId::new(request.category_id),
            },
        )?;

        let mut tx = self.store.begin().await?;
        ensure_code_free(&mut tx, instrument.code(), None).await?;
        ensure_category(&mut tx, instrument.category_id()).await?;
        tx.insert_instrument(&instrument).await?;
        price_ledger::record_price(&mut tx, instrument.id(), price.amount()).await?;
        let dto = describe(&mut tx, &instrument).await?;
        tx.commit().await?;

        info!(
            instrument_id = %instrument.id(),
            code = instrument.code(),
            price = %price,
            "Instrument created"
        );
        Ok(dto)
    }

    /// Partially update an instrument.
    ///
    /// A price that differs from the current one is appended to the history.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown instrument or category
    /// - `Validation` for invalid fields, a non-positive price, negative
    ///   stock or a code used by another instrument
    pub async fn update(
        &self,
        id: &InstrumentId,
        request: UpdateInstrumentDto,
    ) -> Result<InstrumentDto, ServiceError> {
        let price = request.price.map(Money::price).transpose()?;
        let patch = InstrumentPatch {
            code: request.code,
            name: request.name,
            brand: request.brand,
            stock: request.stock.map(stock_count).transpose()?,
            description: request.description,
            image: request.image,
            category_id: request.category_id.map(CategoryId::new),
        };

        let mut tx = self.store.begin().await?;
        let mut instrument = tx
            .instrument(id)
            .await?
            .ok_or_else(|| instrument_not_found(id))?;
        if let Some(code) = &patch.code {
            ensure_code_free(&mut tx, code, Some(id)).await?;
        }
        if let Some(category) = &patch.category_id {
            ensure_category(&mut tx, category).await?;
        }
        instrument.apply(patch)?;
        tx.update_instrument(&instrument).await?;

        if let Some(price) = price {
            if price != price_ledger::current_price(&mut tx, id).await? {
                price_ledger::record_price(&mut tx, id, price.amount()).await?;
            }
        }
        let dto = describe(&mut tx, &instrument).await?;
        tx.commit().await?;

        info!(instrument_id = %id, "Instrument updated");
        Ok(dto)
    }

    /// Delete an instrument that appears in no order. Its price history goes
    /// with it.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown instrument
    /// - `Validation` when an order references the instrument
    pub async fn delete(&self, id: &InstrumentId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.instrument(id).await?.is_none() {
            return Err(instrument_not_found(id));
        }
        if tx.instrument_is_ordered(id).await? {
            return Err(ServiceError::validation(
                "Instrument appears in orders and cannot be deleted",
            ));
        }
        tx.delete_instrument(id).await?;
        tx.commit().await?;

        info!(instrument_id = %id, "Instrument deleted");
        Ok(())
    }

    /// Append a new price.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive price or an unknown instrument.
    pub async fn record_price(&self, id: &InstrumentId, price: Decimal) -> Result<PriceEntryDto, ServiceError> {
        let mut tx = self.store.begin().await?;
        let entry = price_ledger::record_price(&mut tx, id, price).await?;
        tx.commit().await?;

        info!(instrument_id = %id, price = %entry.price(), "Price recorded");
        Ok(PriceEntryDto::from(&entry))
    }

    /// Add units to stock.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive quantity
    /// - `NotFound` for an unknown instrument
    pub async fn replenish(&self, id: &InstrumentId, quantity: i64) -> Result<StockDto, ServiceError> {
        let mut tx = self.store.begin().await?;
        let stock = stock_ledger::increment(&mut tx, id, quantity).await?;
        tx.commit().await?;

        info!(instrument_id = %id, quantity, stock, "Stock replenished");
        Ok(StockDto {
            instrument_id: id.to_string(),
            stock,
        })
    }
}

async fn describe<T: StoreTx>(tx: &mut T, instrument: &Instrument) -> Result<InstrumentDto, ServiceError> {
    let price = price_ledger::current_price(tx, instrument.id()).await?;
    let category = tx
        .category(instrument.category_id())
        .await?
        .map(|category| category.name().to_string());
    Ok(InstrumentDto::new(instrument, price, category))
}

async fn ensure_code_free<T: StoreTx>(
    tx: &mut T,
    code: &str,
    owner: Option<&InstrumentId>,
) -> Result<(), ServiceError> {
    match tx.instrument_by_code(code).await? {
        Some(existing) if Some(existing.id()) != owner => Err(ServiceError::validation(format!(
            "Instrument code already exists: {code}"
        ))),
        _ => Ok(()),
    }
}

async fn ensure_category<T: StoreTx>(tx: &mut T, id: &CategoryId) -> Result<(), ServiceError> {
    if tx.category(id).await?.is_none() {
        return Err(ServiceError::not_found(format!("Category not found: {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{OrderLineRequestDto, PlaceOrderDto};
    use crate::application::test_support::{DRUM, GUITAR, PERCUSSION, STRINGS, VIEWER, dec, fixture};
    use crate::application::use_cases::OrderWorkflowUseCase;
    use crate::domain::shared::UserId;
    use crate::error::ErrorCode;
    use crate::infrastructure::persistence::InMemoryStore;

    async fn setup() -> (Arc<InMemoryStore>, ManageCatalogUseCase<InMemoryStore>) {
        let store = Arc::new(fixture().await);
        (Arc::clone(&store), ManageCatalogUseCase::new(store))
    }

    fn new_instrument(code: &str) -> CreateInstrumentDto {
        CreateInstrumentDto {
            code: code.to_string(),
            name: "Violín".to_string(),
            brand: "Stentor".to_string(),
            stock: 3,
            description: String::new(),
            image: String::new(),
            price: dec(250),
            category_id: STRINGS.to_string(),
        }
    }

    #[tokio::test]
    async fn list_filters_by_category_and_attaches_price() {
        let (_, catalog) = setup().await;

        let all = catalog.list(None).await.unwrap();
        let percussion = catalog.list(Some(&CategoryId::new(PERCUSSION))).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(percussion.len(), 1);
        assert_eq!(percussion[0].id, DRUM);
        assert_eq!(percussion[0].current_price, Money::from_cents(5_000));
        assert_eq!(percussion[0].category.as_deref(), Some("Percusión"));
    }

    #[tokio::test]
    async fn create_seeds_price_history() {
        let (_, catalog) = setup().await;

        let created = catalog.create(new_instrument("INST-9")).await.unwrap();
        let history = catalog
            .price_history(&InstrumentId::new(&created.id))
            .await
            .unwrap();

        assert_eq!(created.current_price, Money::from_cents(25_000));
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_requests() {
        let (_, catalog) = setup().await;

        let duplicate = catalog.create(new_instrument("INST-1")).await;
        assert_eq!(duplicate.unwrap_err().code(), ErrorCode::Validation);

        let mut free = new_instrument("INST-9");
        free.price = Decimal::ZERO;
        assert_eq!(catalog.create(free).await.unwrap_err().code(), ErrorCode::Validation);

        let mut negative = new_instrument("INST-9");
        negative.stock = -1;
        assert_eq!(catalog.create(negative).await.unwrap_err().code(), ErrorCode::Validation);

        let mut orphan = new_instrument("INST-9");
        orphan.category_id = "ghost".to_string();
        assert_eq!(catalog.create(orphan).await.unwrap_err().code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn update_appends_changed_price_only() {
        let (_, catalog) = setup().await;
        let guitar = InstrumentId::new(GUITAR);

        let same = UpdateInstrumentDto {
            price: Some(dec(100)),
            ..UpdateInstrumentDto::default()
        };
        catalog.update(&guitar, same).await.unwrap();
        assert_eq!(catalog.price_history(&guitar).await.unwrap().len(), 1);

        let changed = UpdateInstrumentDto {
            name: Some("Guitarra Clásica".to_string()),
            price: Some(dec(120)),
            ..UpdateInstrumentDto::default()
        };
        let updated = catalog.update(&guitar, changed).await.unwrap();

        assert_eq!(updated.name, "Guitarra Clásica");
        assert_eq!(updated.current_price, Money::from_cents(12_000));
        assert_eq!(catalog.price_history(&guitar).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_rejects_code_of_another_instrument() {
        let (_, catalog) = setup().await;

        let clash = UpdateInstrumentDto {
            code: Some("INST-2".to_string()),
            ..UpdateInstrumentDto::default()
        };
        let own = UpdateInstrumentDto {
            code: Some("INST-1".to_string()),
            ..UpdateInstrumentDto::default()
        };

        let err = catalog.update(&InstrumentId::new(GUITAR), clash).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(catalog.update(&InstrumentId::new(GUITAR), own).await.is_ok());
    }

    #[tokio::test]
    async fn delete_is_blocked_by_orders() {
        let (store, catalog) = setup().await;
        OrderWorkflowUseCase::new(Arc::clone(&store))
            .create_order(
                &UserId::new(VIEWER),
                PlaceOrderDto {
                    lines: vec![OrderLineRequestDto {
                        instrument_id: GUITAR.to_string(),
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();

        let blocked = catalog.delete(&InstrumentId::new(GUITAR)).await;
        assert_eq!(blocked.unwrap_err().code(), ErrorCode::Validation);

        catalog.delete(&InstrumentId::new(DRUM)).await.unwrap();
        let gone = catalog.get(&InstrumentId::new(DRUM)).await;
        assert_eq!(gone.unwrap_err().code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn record_price_and_replenish() {
        let (_, catalog) = setup().await;
        let drum = InstrumentId::new(DRUM);

        let entry = catalog.record_price(&drum, dec(60)).await.unwrap();
        assert_eq!(entry.price, Money::from_cents(6_000));
        assert_eq!(catalog.get(&drum).await.unwrap().current_price, entry.price);

        let stock = catalog.replenish(&drum, 7).await.unwrap();
        assert_eq!(stock.stock, 12);

        let missing = catalog.record_price(&InstrumentId::new("ghost"), dec(1)).await;
        assert_eq!(missing.unwrap_err().code(), ErrorCode::Validation);
        let zero = catalog.replenish(&drum, 0).await;
        assert_eq!(zero.unwrap_err().code(), ErrorCode::Validation);
    }
}
