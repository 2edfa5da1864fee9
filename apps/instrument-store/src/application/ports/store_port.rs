//! Store Port (Driven Port)
//!
//! The relational store is the only shared mutable resource. Every use case
//! opens one transaction, performs all reads and writes through it and
//! commits once. Dropping a transaction without committing rolls it back.

use async_trait::async_trait;

use crate::domain::catalog::{Category, Instrument, PriceEntry};
use crate::domain::identity::{Role, User};
use crate::domain::ordering::{Order, OrderStatus, StatusEvent};
use crate::domain::shared::{
    CategoryId, InstrumentId, Money, OrderId, Quantity, Timestamp, UserId,
};

/// Store port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to execute a statement.
    #[error("Store backend error: {message}")]
    Backend {
        /// Error details.
        message: String,
    },

    /// A persisted row could not be mapped back into the domain.
    #[error("Corrupt stored data: {message}")]
    Corrupt {
        /// Error details.
        message: String,
    },

    /// A uniqueness or foreign-key constraint rejected a write.
    #[error("Constraint violated: {message}")]
    Constraint {
        /// Error details.
        message: String,
    },
}

/// Factory of transactions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Transaction type handed out by this store.
    type Tx: StoreTx;

    /// Open a write transaction. Write transactions are serialized.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Open a read transaction. Committing it is a no-op.
    async fn read(&self) -> Result<Self::Tx, StoreError>;
}

/// Unit of work over the catalog, identity and ordering tables.
#[async_trait]
pub trait StoreTx: Send + Sized {
    // Catalog: instruments

    /// Instrument by id.
    async fn instrument(&mut self, id: &InstrumentId) -> Result<Option<Instrument>, StoreError>;

    /// Instrument by catalog code.
    async fn instrument_by_code(&mut self, code: &str) -> Result<Option<Instrument>, StoreError>;

    /// All instruments, optionally restricted to one category, ordered by name.
    async fn instruments(
        &mut self,
        category: Option<&CategoryId>,
    ) -> Result<Vec<Instrument>, StoreError>;

    /// Insert a new instrument.
    async fn insert_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError>;

    /// Overwrite an existing instrument's fields.
    async fn update_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError>;

    /// Delete an instrument and its price history. False if it did not exist.
    async fn delete_instrument(&mut self, id: &InstrumentId) -> Result<bool, StoreError>;

    /// Whether any order line references the instrument.
    async fn instrument_is_ordered(&mut self, id: &InstrumentId) -> Result<bool, StoreError>;

    // Stock

    /// Subtract `quantity` if and only if at least that much is on hand.
    ///
    /// Returns the new stock, or `None` when the instrument is missing or
    /// the stock is insufficient. The check and the write are one statement.
    async fn try_decrement_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError>;

    /// Add `quantity`. Returns the new stock, or `None` when missing or when
    /// the sum would not fit a `u32`.
    async fn increment_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError>;

    // Prices

    /// Append a price entry; the store assigns its sequence.
    async fn append_price(
        &mut self,
        id: &InstrumentId,
        price: Money,
        recorded_at: Timestamp,
    ) -> Result<PriceEntry, StoreError>;

    /// Newest entry by `(recorded_at, sequence)`.
    async fn latest_price(&mut self, id: &InstrumentId) -> Result<Option<PriceEntry>, StoreError>;

    /// Full history, newest first.
    async fn price_history(&mut self, id: &InstrumentId) -> Result<Vec<PriceEntry>, StoreError>;

    // Catalog: categories

    /// All categories ordered by name.
    async fn categories(&mut self) -> Result<Vec<Category>, StoreError>;

    /// Category by id.
    async fn category(&mut self, id: &CategoryId) -> Result<Option<Category>, StoreError>;

    /// Category by exact name.
    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError>;

    /// Insert a new category.
    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError>;

    /// Overwrite an existing category.
    async fn update_category(&mut self, category: &Category) -> Result<(), StoreError>;

    /// Delete a category. False if it did not exist.
    async fn delete_category(&mut self, id: &CategoryId) -> Result<bool, StoreError>;

    /// Whether any instrument belongs to the category.
    async fn category_in_use(&mut self, id: &CategoryId) -> Result<bool, StoreError>;

    // Identity

    /// Seeded roles.
    async fn roles(&mut self) -> Result<Vec<Role>, StoreError>;

    /// Insert a role.
    async fn insert_role(&mut self, role: Role) -> Result<(), StoreError>;

    /// All users ordered by email.
    async fn users(&mut self) -> Result<Vec<User>, StoreError>;

    /// User by id.
    async fn user(&mut self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// User by login email.
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user.
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Overwrite an existing user.
    async fn update_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Delete a user. False if it did not exist.
    async fn delete_user(&mut self, id: &UserId) -> Result<bool, StoreError>;

    /// Whether the user owns any order.
    async fn user_has_orders(&mut self, id: &UserId) -> Result<bool, StoreError>;

    // Ordering

    /// Insert an order header and its lines. Status events are appended
    /// separately.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Append a status event; the store assigns its sequence.
    async fn append_status(
        &mut self,
        id: &OrderId,
        status: &OrderStatus,
        recorded_at: Timestamp,
    ) -> Result<StatusEvent, StoreError>;

    /// Order with its lines and full status history.
    async fn order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders, optionally restricted to one user, newest first.
    async fn orders(&mut self, user: Option<&UserId>) -> Result<Vec<Order>, StoreError>;

    /// Delete an order with its lines and events. False if it did not exist.
    async fn delete_order(&mut self, id: &OrderId) -> Result<bool, StoreError>;

    // Completion

    /// Make every write of this transaction visible atomically.
    async fn commit(self) -> Result<(), StoreError>;
}
