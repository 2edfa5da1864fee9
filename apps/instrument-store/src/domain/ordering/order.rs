//! Order Aggregate Root

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::status::{OrderStatus, StatusEvent};
use crate::domain::shared::{DomainError, InstrumentId, Money, OrderId, Quantity, Timestamp, UserId};

/// One line of an order. Immutable once the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    instrument_id: InstrumentId,
    quantity: Quantity,
    unit_price: Money,
}

impl OrderLine {
    /// Build a line with the unit price captured at placement.
    #[must_use]
    pub const fn new(instrument_id: InstrumentId, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            instrument_id,
            quantity,
            unit_price,
        }
    }

    /// Ordered instrument.
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Ordered units.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Unit price at placement.
    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// `quantity × unit_price`.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A customer order.
///
/// Lines keep insertion order and never change after placement. Status
/// events only ever get added and are held newest first, so the head of the
/// history is the current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    created_at: Timestamp,
    lines: Vec<OrderLine>,
    history: Vec<StatusEvent>,
}

impl Order {
    /// Start a new order with no status history yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` if `lines` is empty.
    pub fn place(
        id: OrderId,
        user_id: UserId,
        created_at: Timestamp,
        lines: Vec<OrderLine>,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::invalid(
                "lines",
                "an order must have at least one line",
            ));
        }
        Ok(Self {
            id,
            user_id,
            created_at,
            lines,
            history: Vec::new(),
        })
    }

    /// Rebuild from storage without validation. `history` may come in any
    /// order.
    #[must_use]
    pub fn reconstitute(
        id: OrderId,
        user_id: UserId,
        created_at: Timestamp,
        lines: Vec<OrderLine>,
        mut history: Vec<StatusEvent>,
    ) -> Self {
        history.sort_by_key(|event| Reverse(event.recency()));
        Self {
            id,
            user_id,
            created_at,
            lines,
            history,
        }
    }

    /// Add a status event to the in-memory history.
    pub fn record(&mut self, event: StatusEvent) {
        let at = self
            .history
            .partition_point(|existing| existing.recency() > event.recency());
        self.history.insert(at, event);
    }

    /// Order identifier.
    #[must_use]
    pub const fn id(&self) -> &OrderId {
        &self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Placement time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Status history, newest first.
    #[must_use]
    pub fn history(&self) -> &[StatusEvent] {
        &self.history
    }

    /// Current status derived from the history.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.history
            .first()
            .map_or_else(OrderStatus::pending, |event| event.status().clone())
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}
