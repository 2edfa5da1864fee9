//! Order Workflow Use Case
//!
//! Places orders, changes their status and deletes them. Each operation is
//! one store transaction: either every stock change, order row and status
//! event is committed, or none is.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::dto::{OrderDto, PlaceOrderDto};
use crate::application::ports::{Store, StoreTx};
use crate::application::services::{price_ledger, stock_ledger};
use crate::domain::ordering::{Order, OrderLine, OrderStatus};
use crate::domain::shared::{InstrumentId, OrderId, Quantity, Timestamp, UserId};
use crate::error::ServiceError;

pub(crate) fn order_not_found(id: &OrderId) -> ServiceError {
    ServiceError::not_found(format!("Order not found: {id}"))
}

/// Use case driving the order lifecycle.
pub struct OrderWorkflowUseCase<S>
where
    S: Store,
{
    store: Arc<S>,
}

impl<S> OrderWorkflowUseCase<S>
where
    S: Store,
{
    /// Create a new `OrderWorkflowUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Place an order for `user_id`.
    ///
    /// Lines are processed in input order: instrument lookup, stock check
    /// and decrement, then the unit price is captured from the price ledger.
    /// The order gets an initial `PENDING` event.
    ///
    /// # Errors
    ///
    /// - `Validation` for no lines, a non-positive quantity or an unknown user
    /// - `NotFound` for an unknown instrument
    /// - `InsufficientStock` naming the instrument and its stock
    pub async fn create_order(
        &self,
        user_id: &UserId,
        request: PlaceOrderDto,
    ) -> Result<OrderDto, ServiceError> {
        if request.lines.is_empty() {
            return Err(ServiceError::validation(
                "An order must have at least one line",
            ));
        }
        let requested = request
            .lines
            .into_iter()
            .map(|line| Ok((InstrumentId::new(line.instrument_id), Quantity::new(line.quantity)?)))
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let mut tx = self.store.begin().await?;

        if tx.user(user_id).await?.is_none() {
            return Err(ServiceError::validation(format!(
                "User not found: {user_id}"
            )));
        }

        let mut lines = Vec::with_capacity(requested.len());
        for (instrument_id, quantity) in requested {
            stock_ledger::decrement(&mut tx, &instrument_id, i64::from(quantity.get())).await?;
            let unit_price = price_ledger::current_price(&mut tx, &instrument_id).await?;
            lines.push(OrderLine::new(instrument_id, quantity, unit_price));
        }

        let now = Timestamp::now();
        let mut order = Order::place(OrderId::generate(), user_id.clone(), now, lines)?;
        tx.insert_order(&order).await?;
        let initial = tx
            .append_status(order.id(), &OrderStatus::pending(), now)
            .await?;
        order.record(initial);

        tx.commit().await?;

        info!(
            order_id = %order.id(),
            user_id = %user_id,
            lines = order.lines().len(),
            total = %order.total(),
            "Order placed"
        );
        Ok(OrderDto::from(&order))
    }

    /// Append a status event to an order.
    ///
    /// Any non-blank label is accepted. Entering `CANCELLED` restores the
    /// stock of every line, including when the order was already cancelled.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown order
    /// - `Validation` for a blank label
    pub async fn set_status(&self, order_id: &OrderId, label: &str) -> Result<OrderDto, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        let status = OrderStatus::new(label)?;
        let previous = order.status();

        let event = tx
            .append_status(order_id, &status, Timestamp::now())
            .await?;

        if status.is_cancelled() {
            if previous.is_cancelled() {
                warn!(order_id = %order_id, "Order cancelled again; restoring stock again");
            }
            restore_stock(&mut tx, &order).await?;
        }
        order.record(event);

        tx.commit().await?;

        info!(
            order_id = %order_id,
            from = %previous,
            to = %status,
            "Order status changed"
        );
        Ok(OrderDto::from(&order))
    }

    /// Delete a `PENDING` order, restoring the stock of every line.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown order
    /// - `Validation` when the current status is not `PENDING`
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;

        if !order.status().is_pending() {
            return Err(ServiceError::validation(
                "Only PENDING orders may be deleted",
            ));
        }

        restore_stock(&mut tx, &order).await?;
        tx.delete_order(order_id).await?;
        tx.commit().await?;

        info!(order_id = %order_id, lines = order.lines().len(), "Order deleted");
        Ok(())
    }
}

async fn restore_stock<T: StoreTx>(tx: &mut T, order: &Order) -> Result<(), ServiceError> {
    for line in order.lines() {
        stock_ledger::increment(tx, line.instrument_id(), i64::from(line.quantity().get())).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::OrderLineRequestDto;
    use crate::application::test_support::{DRUM, GUITAR, VIEWER, dec, fixture};
    use crate::error::ErrorCode;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::domain::shared::Money;

    fn request(lines: &[(&str, i64)]) -> PlaceOrderDto {
        PlaceOrderDto {
            lines: lines
                .iter()
                .map(|(id, quantity)| OrderLineRequestDto {
                    instrument_id: (*id).to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn stock(store: &InMemoryStore, id: &str) -> u32 {
        let mut tx = store.read().await.unwrap();
        stock_ledger::current_stock(&mut tx, &InstrumentId::new(id))
            .await
            .unwrap()
    }

    async fn order_count(store: &InMemoryStore) -> usize {
        let mut tx = store.read().await.unwrap();
        tx.orders(None).await.unwrap().len()
    }

    async fn setup() -> (Arc<InMemoryStore>, OrderWorkflowUseCase<InMemoryStore>) {
        let store = Arc::new(fixture().await);
        let use_case = OrderWorkflowUseCase::new(Arc::clone(&store));
        (store, use_case)
    }

    #[tokio::test]
    async fn create_order_decrements_stock_and_starts_pending() {
        let (store, workflow) = setup().await;

        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 2), (DRUM, 1)]))
            .await
            .unwrap();

        assert_eq!(stock(&store, GUITAR).await, 8);
        assert_eq!(stock(&store, DRUM).await, 4);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].instrument_id, GUITAR);
        assert_eq!(order.history.len(), 1);
        assert_eq!(order.status, OrderStatus::PENDING);
        assert_eq!(order.total, Money::from_cents(25_000));
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_everything() {
        let (store, workflow) = setup().await;

        let err = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 2), (DRUM, 6)]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::InsufficientStock {
                instrument: "Bombo".to_string(),
                available: 5,
            }
        );
        assert_eq!(stock(&store, GUITAR).await, 10);
        assert_eq!(stock(&store, DRUM).await, 5);
        assert_eq!(order_count(&store).await, 0);
    }

    #[tokio::test]
    async fn unknown_instrument_is_not_found_and_rolls_back() {
        let (store, workflow) = setup().await;

        let err = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 1), ("ghost", 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(stock(&store, GUITAR).await, 10);
        assert_eq!(order_count(&store).await, 0);
    }

    #[tokio::test]
    async fn invalid_requests_are_validation_errors() {
        let (store, workflow) = setup().await;
        let viewer = UserId::new(VIEWER);

        let empty = workflow.create_order(&viewer, request(&[])).await;
        let zero = workflow.create_order(&viewer, request(&[(GUITAR, 0)])).await;
        let stranger = workflow
            .create_order(&UserId::new("nobody"), request(&[(GUITAR, 1)]))
            .await;

        for result in [empty, zero, stranger] {
            assert_eq!(result.unwrap_err().code(), ErrorCode::Validation);
        }
        assert_eq!(stock(&store, GUITAR).await, 10);
    }

    #[tokio::test]
    async fn unit_price_is_frozen_at_placement() {
        let (store, workflow) = setup().await;
        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 1)]))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        price_ledger::record_price(&mut tx, &InstrumentId::new(GUITAR), dec(999))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.read().await.unwrap();
        let reloaded = tx.order(&OrderId::new(&order.id)).await.unwrap().unwrap();
        assert_eq!(reloaded.total(), Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn cancel_restores_stock_and_blocks_delete() {
        let (store, workflow) = setup().await;
        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 2), (DRUM, 1)]))
            .await
            .unwrap();
        let id = OrderId::new(&order.id);

        let cancelled = workflow.set_status(&id, OrderStatus::CANCELLED).await.unwrap();

        assert_eq!(cancelled.status, OrderStatus::CANCELLED);
        assert_eq!(cancelled.history.len(), 2);
        assert_eq!(cancelled.history[0].status, OrderStatus::CANCELLED);
        assert_eq!(stock(&store, GUITAR).await, 10);
        assert_eq!(stock(&store, DRUM).await, 5);

        let err = workflow.delete_order(&id).await.unwrap_err();
        assert_eq!(err, ServiceError::validation("Only PENDING orders may be deleted"));
    }

    #[tokio::test]
    async fn cancelling_twice_restores_twice() {
        let (store, workflow) = setup().await;
        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 3)]))
            .await
            .unwrap();
        let id = OrderId::new(&order.id);

        workflow.set_status(&id, OrderStatus::CANCELLED).await.unwrap();
        workflow.set_status(&id, OrderStatus::CANCELLED).await.unwrap();

        assert_eq!(stock(&store, GUITAR).await, 13);
    }

    #[tokio::test]
    async fn free_form_status_has_no_side_effect() {
        let (store, workflow) = setup().await;
        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 1)]))
            .await
            .unwrap();
        let id = OrderId::new(&order.id);

        let shipped = workflow.set_status(&id, "SHIPPED").await.unwrap();
        let lower = workflow.set_status(&id, "cancelled").await.unwrap();

        assert_eq!(shipped.status, "SHIPPED");
        assert_eq!(lower.status, "cancelled");
        assert_eq!(stock(&store, GUITAR).await, 9);
    }

    #[tokio::test]
    async fn set_status_errors() {
        let (_store, workflow) = setup().await;
        let ghost = workflow.set_status(&OrderId::new("ghost"), "SHIPPED").await;
        assert_eq!(ghost.unwrap_err().code(), ErrorCode::NotFound);

        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 1)]))
            .await
            .unwrap();
        let blank = workflow.set_status(&OrderId::new(&order.id), "  ").await;
        assert_eq!(blank.unwrap_err().code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn delete_pending_order_restores_stock() {
        let (store, workflow) = setup().await;
        let order = workflow
            .create_order(&UserId::new(VIEWER), request(&[(GUITAR, 4), (DRUM, 2)]))
            .await
            .unwrap();

        workflow.delete_order(&OrderId::new(&order.id)).await.unwrap();

        assert_eq!(stock(&store, GUITAR).await, 10);
        assert_eq!(stock(&store, DRUM).await, 5);
        assert_eq!(order_count(&store).await, 0);

        let again = workflow.delete_order(&OrderId::new(&order.id)).await;
        assert_eq!(again.unwrap_err().code(), ErrorCode::NotFound);
    }
}
