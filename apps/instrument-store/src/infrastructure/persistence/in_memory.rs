//! In-memory store for tests and development.
//!
//! A write transaction holds the store lock for its whole lifetime and works
//! on a private copy of the state; commit swaps the copy in. Dropping the
//! transaction discards the copy. Constraints mirror the SQLite schema so
//! both adapters reject the same writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::{Store, StoreError, StoreTx};
use crate::domain::catalog::{Category, Instrument, PriceEntry};
use crate::domain::identity::{Role, User};
use crate::domain::ordering::{Order, OrderStatus, StatusEvent};
use crate::domain::shared::{
    CategoryId, InstrumentId, Money, OrderId, Quantity, Timestamp, UserId,
};

#[derive(Debug, Clone, Default)]
struct State {
    instruments: BTreeMap<InstrumentId, Instrument>,
    prices: Vec<PriceEntry>,
    categories: BTreeMap<CategoryId, Category>,
    roles: Vec<Role>,
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    next_sequence: i64,
}

impl State {
    const fn next_sequence(&mut self) -> i64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn instrument_is_ordered(&self, id: &InstrumentId) -> bool {
        self.orders
            .values()
            .any(|order| order.lines().iter().any(|line| line.instrument_id() == id))
    }
}

/// In-memory implementation of [`Store`].
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transaction over an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryTx {
    staged: State,
    guard: Option<OwnedMutexGuard<State>>,
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(InMemoryTx {
            staged: guard.clone(),
            guard: Some(guard),
        })
    }

    async fn read(&self) -> Result<Self::Tx, StoreError> {
        let staged = self.state.lock().await.clone();
        Ok(InMemoryTx {
            staged,
            guard: None,
        })
    }
}

fn constraint(message: impl Into<String>) -> StoreError {
    StoreError::Constraint {
        message: message.into(),
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn instrument(&mut self, id: &InstrumentId) -> Result<Option<Instrument>, StoreError> {
        Ok(self.staged.instruments.get(id).cloned())
    }

    async fn instrument_by_code(&mut self, code: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(self
            .staged
            .instruments
            .values()
            .find(|i| i.code() == code)
            .cloned())
    }

    async fn instruments(
        &mut self,
        category: Option<&CategoryId>,
    ) -> Result<Vec<Instrument>, StoreError> {
        let mut found: Vec<Instrument> = self
            .staged
            .instruments
            .values()
            .filter(|i| category.is_none_or(|c| i.category_id() == c))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(found)
    }

    async fn insert_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state.instruments.contains_key(instrument.id())
            || state.instruments.values().any(|i| i.code() == instrument.code())
        {
            return Err(constraint("instruments.code must be unique"));
        }
        if !state.categories.contains_key(instrument.category_id()) {
            return Err(constraint("instruments.category_id references a missing category"));
        }
        state
            .instruments
            .insert(instrument.id().clone(), instrument.clone());
        Ok(())
    }

    async fn update_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state
            .instruments
            .values()
            .any(|i| i.code() == instrument.code() && i.id() != instrument.id())
        {
            return Err(constraint("instruments.code must be unique"));
        }
        if !state.categories.contains_key(instrument.category_id()) {
            return Err(constraint("instruments.category_id references a missing category"));
        }
        if let Some(slot) = state.instruments.get_mut(instrument.id()) {
            *slot = instrument.clone();
        }
        Ok(())
    }

    async fn delete_instrument(&mut self, id: &InstrumentId) -> Result<bool, StoreError> {
        if self.staged.instrument_is_ordered(id) {
            return Err(constraint("order_lines reference the instrument"));
        }
        if self.staged.instruments.remove(id).is_none() {
            return Ok(false);
        }
        self.staged.prices.retain(|entry| entry.instrument_id() != id);
        Ok(true)
    }

    async fn instrument_is_ordered(&mut self, id: &InstrumentId) -> Result<bool, StoreError> {
        Ok(self.staged.instrument_is_ordered(id))
    }

    async fn try_decrement_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError> {
        let Some(instrument) = self.staged.instruments.get_mut(id) else {
            return Ok(None);
        };
        let Some(stock) = instrument.stock().checked_sub(quantity.get()) else {
            return Ok(None);
        };
        instrument.set_stock(stock);
        Ok(Some(stock))
    }

    async fn increment_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError> {
        let Some(instrument) = self.staged.instruments.get_mut(id) else {
            return Ok(None);
        };
        let Some(stock) = instrument.stock().checked_add(quantity.get()) else {
            return Ok(None);
        };
        instrument.set_stock(stock);
        Ok(Some(stock))
    }

    async fn append_price(
        &mut self,
        id: &InstrumentId,
        price: Money,
        recorded_at: Timestamp,
    ) -> Result<PriceEntry, StoreError> {
        if !self.staged.instruments.contains_key(id) {
            return Err(constraint("price_entries.instrument_id references a missing instrument"));
        }
        let sequence = self.staged.next_sequence();
        let entry = PriceEntry::new(id.clone(), price, recorded_at, sequence);
        self.staged.prices.push(entry.clone());
        Ok(entry)
    }

    async fn latest_price(&mut self, id: &InstrumentId) -> Result<Option<PriceEntry>, StoreError> {
        Ok(self
            .staged
            .prices
            .iter()
            .filter(|entry| entry.instrument_id() == id)
            .max_by_key(|entry| entry.recency())
            .cloned())
    }

    async fn price_history(&mut self, id: &InstrumentId) -> Result<Vec<PriceEntry>, StoreError> {
        let mut history: Vec<PriceEntry> = self
            .staged
            .prices
            .iter()
            .filter(|entry| entry.instrument_id() == id)
            .cloned()
            .collect();
        history.sort_by_key(|entry| std::cmp::Reverse(entry.recency()));
        Ok(history)
    }

    async fn categories(&mut self) -> Result<Vec<Category>, StoreError> {
        let mut found: Vec<Category> = self.staged.categories.values().cloned().collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(found)
    }

    async fn category(&mut self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.staged.categories.get(id).cloned())
    }

    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .staged
            .categories
            .values()
            .find(|c| c.name() == name)
            .cloned())
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state.categories.contains_key(category.id())
            || state.categories.values().any(|c| c.name() == category.name())
        {
            return Err(constraint("categories.name must be unique"));
        }
        state
            .categories
            .insert(category.id().clone(), category.clone());
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state
            .categories
            .values()
            .any(|c| c.name() == category.name() && c.id() != category.id())
        {
            return Err(constraint("categories.name must be unique"));
        }
        if let Some(slot) = state.categories.get_mut(category.id()) {
            *slot = category.clone();
        }
        Ok(())
    }

    async fn delete_category(&mut self, id: &CategoryId) -> Result<bool, StoreError> {
        if self
            .staged
            .instruments
            .values()
            .any(|i| i.category_id() == id)
        {
            return Err(constraint("instruments reference the category"));
        }
        Ok(self.staged.categories.remove(id).is_some())
    }

    async fn category_in_use(&mut self, id: &CategoryId) -> Result<bool, StoreError> {
        Ok(self
            .staged
            .instruments
            .values()
            .any(|i| i.category_id() == id))
    }

    async fn roles(&mut self) -> Result<Vec<Role>, StoreError> {
        Ok(self.staged.roles.clone())
    }

    async fn insert_role(&mut self, role: Role) -> Result<(), StoreError> {
        if self.staged.roles.contains(&role) {
            return Err(constraint("roles.name must be unique"));
        }
        self.staged.roles.push(role);
        Ok(())
    }

    async fn users(&mut self) -> Result<Vec<User>, StoreError> {
        let mut found: Vec<User> = self.staged.users.values().cloned().collect();
        found.sort_by(|a, b| a.email().cmp(b.email()));
        Ok(found)
    }

    async fn user(&mut self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.get(id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state.users.contains_key(user.id())
            || state.users.values().any(|u| u.email() == user.email())
        {
            return Err(constraint("users.email must be unique"));
        }
        if !state.roles.contains(&user.role()) {
            return Err(constraint("users.role references a missing role"));
        }
        state.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state
            .users
            .values()
            .any(|u| u.email() == user.email() && u.id() != user.id())
        {
            return Err(constraint("users.email must be unique"));
        }
        if !state.roles.contains(&user.role()) {
            return Err(constraint("users.role references a missing role"));
        }
        if let Some(slot) = state.users.get_mut(user.id()) {
            *slot = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: &UserId) -> Result<bool, StoreError> {
        if self.staged.orders.values().any(|o| o.user_id() == id) {
            return Err(constraint("orders reference the user"));
        }
        Ok(self.staged.users.remove(id).is_some())
    }

    async fn user_has_orders(&mut self, id: &UserId) -> Result<bool, StoreError> {
        Ok(self.staged.orders.values().any(|o| o.user_id() == id))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let state = &mut self.staged;
        if state.orders.contains_key(order.id()) {
            return Err(constraint("orders.id must be unique"));
        }
        if !state.users.contains_key(order.user_id()) {
            return Err(constraint("orders.user_id references a missing user"));
        }
        if let Some(line) = order
            .lines()
            .iter()
            .find(|line| !state.instruments.contains_key(line.instrument_id()))
        {
            return Err(constraint(format!(
                "order_lines.instrument_id references missing instrument {}",
                line.instrument_id()
            )));
        }
        let header = Order::reconstitute(
            order.id().clone(),
            order.user_id().clone(),
            order.created_at(),
            order.lines().to_vec(),
            Vec::new(),
        );
        state.orders.insert(order.id().clone(), header);
        Ok(())
    }

    async fn append_status(
        &mut self,
        id: &OrderId,
        status: &OrderStatus,
        recorded_at: Timestamp,
    ) -> Result<StatusEvent, StoreError> {
        let sequence = self.staged.next_sequence();
        let order = self
            .staged
            .orders
            .get_mut(id)
            .ok_or_else(|| constraint("status_events.order_id references a missing order"))?;
        let event = StatusEvent::new(status.clone(), recorded_at, sequence);
        order.record(event.clone());
        Ok(event)
    }

    async fn order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.staged.orders.get(id).cloned())
    }

    async fn orders(&mut self, user: Option<&UserId>) -> Result<Vec<Order>, StoreError> {
        let mut found: Vec<Order> = self
            .staged
            .orders
            .values()
            .filter(|o| user.is_none_or(|u| o.user_id() == u))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(found)
    }

    async fn delete_order(&mut self, id: &OrderId) -> Result<bool, StoreError> {
        Ok(self.staged.orders.remove(id).is_some())
    }

    async fn commit(self) -> Result<(), StoreError> {
        if let Some(mut guard) = self.guard {
            *guard = self.staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::InstrumentDraft;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_category(&Category::reconstitute(
            CategoryId::new("c1"),
            "Cuerda".to_string(),
        ))
        .await
        .unwrap();
        tx.insert_instrument(&Instrument::reconstitute(
            InstrumentId::new("i1"),
            InstrumentDraft {
                code: "INST-1".to_string(),
                name: "Guitarra".to_string(),
                brand: "Fender".to_string(),
                stock: 3,
                description: String::new(),
                image: String::new(),
                category_id: CategoryId::new("c1"),
            },
        ))
        .await
        .unwrap();
        tx.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = seeded().await;
        let id = InstrumentId::new("i1");

        {
            let mut tx = store.begin().await.unwrap();
            let stock = tx
                .try_decrement_stock(&id, Quantity::new(2).unwrap())
                .await
                .unwrap();
            assert_eq!(stock, Some(1));
        }

        let mut tx = store.read().await.unwrap();
        assert_eq!(tx.instrument(&id).await.unwrap().unwrap().stock(), 3);
    }

    #[tokio::test]
    async fn conditional_decrement_refuses_overdraw() {
        let store = seeded().await;
        let id = InstrumentId::new("i1");
        let mut tx = store.begin().await.unwrap();

        let refused = tx
            .try_decrement_stock(&id, Quantity::new(4).unwrap())
            .await
            .unwrap();
        assert_eq!(refused, None);
        assert_eq!(tx.instrument(&id).await.unwrap().unwrap().stock(), 3);
    }

    #[tokio::test]
    async fn read_transaction_does_not_block_or_publish() {
        let store = seeded().await;
        let id = InstrumentId::new("i1");

        let mut reader = store.read().await.unwrap();
        let mut writer = store.begin().await.unwrap();
        writer
            .increment_stock(&id, Quantity::new(5).unwrap())
            .await
            .unwrap();
        writer.commit().await.unwrap();

        assert_eq!(reader.instrument(&id).await.unwrap().unwrap().stock(), 3);
        reader.commit().await.unwrap();

        let mut fresh = store.read().await.unwrap();
        assert_eq!(fresh.instrument(&id).await.unwrap().unwrap().stock(), 8);
    }

    #[tokio::test]
    async fn deleting_instrument_cascades_prices() {
        let store = seeded().await;
        let id = InstrumentId::new("i1");
        let mut tx = store.begin().await.unwrap();
        tx.append_price(&id, Money::from_cents(100), Timestamp::now())
            .await
            .unwrap();

        assert!(tx.delete_instrument(&id).await.unwrap());
        assert!(tx.price_history(&id).await.unwrap().is_empty());
        assert!(!tx.delete_instrument(&id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_code_is_a_constraint_error() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let existing = tx
            .instrument(&InstrumentId::new("i1"))
            .await
            .unwrap()
            .unwrap();
        let clash = Instrument::reconstitute(InstrumentId::new("i2"), existing.fields().clone());

        let err = tx.insert_instrument(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
    }
}
