//! Query Orders Use Case
//!
//! Read-only views over orders. Callers without `ViewAllOrders` only ever
//! see their own orders.

use std::sync::Arc;

use tracing::debug;

use super::order_workflow::order_not_found;
use super::user_accounts::Caller;
use crate::application::dto::OrderDto;
use crate::application::ports::{Store, StoreTx};
use crate::domain::identity::Capability;
use crate::domain::shared::{OrderId, UserId};
use crate::error::ServiceError;

/// Use case for listing and reading orders.
pub struct QueryOrdersUseCase<S>
where
    S: Store,
{
    store: Arc<S>,
}

impl<S> QueryOrdersUseCase<S>
where
    S: Store,
{
    /// Create a new `QueryOrdersUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` without `ViewAllOrders`.
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<OrderDto>, ServiceError> {
        caller.require(Capability::ViewAllOrders)?;
        self.list(None).await
    }

    /// Orders of one user, newest first.
    ///
    /// # Errors
    ///
    /// - `Forbidden` when asking for another user's orders without `ViewAllOrders`
    /// - `NotFound` for an unknown user
    pub async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: &UserId,
    ) -> Result<Vec<OrderDto>, ServiceError> {
        if caller.user_id() != user_id {
            caller.require(Capability::ViewAllOrders)?;
        }
        let mut tx = self.store.read().await?;
        if tx.user(user_id).await?.is_none() {
            return Err(ServiceError::not_found(format!("User not found: {user_id}")));
        }
        let orders = tx.orders(Some(user_id)).await?;
        debug!(user_id = %user_id, count = orders.len(), "Listed user orders");
        Ok(orders.iter().map(OrderDto::from).collect())
    }

    /// One order with lines and history.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown order
    /// - `Forbidden` for another user's order without `ViewAllOrders`
    pub async fn get(&self, caller: &Caller, order_id: &OrderId) -> Result<OrderDto, ServiceError> {
        let mut tx = self.store.read().await?;
        let order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        if order.user_id() != caller.user_id() {
            caller.require(Capability::ViewAllOrders)?;
        }
        Ok(OrderDto::from(&order))
    }

    async fn list(&self, user_id: Option<&UserId>) -> Result<Vec<OrderDto>, ServiceError> {
        let mut tx = self.store.read().await?;
        let orders = tx.orders(user_id).await?;
        debug!(count = orders.len(), "Listed orders");
        Ok(orders.iter().map(OrderDto::from).collect())
    }
}
