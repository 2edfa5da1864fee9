//! Order DTOs

use serde::{Deserialize, Serialize};

use crate::domain::ordering::{Order, OrderLine, StatusEvent};
use crate::domain::shared::{Money, Timestamp};

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequestDto {
    /// Instrument to buy.
    pub instrument_id: String,
    /// Units; validated as positive by the workflow.
    pub quantity: i64,
}

/// DTO for placing an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderDto {
    /// Requested lines in order.
    pub lines: Vec<OrderLineRequestDto>,
}

/// DTO for a status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusDto {
    /// New status label.
    pub status: String,
}

/// DTO representing an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDto {
    /// Instrument ID.
    pub instrument_id: String,
    /// Units.
    pub quantity: u32,
    /// Unit price at placement.
    pub unit_price: Money,
    /// Quantity times unit price.
    pub subtotal: Money,
}

impl From<&OrderLine> for OrderLineDto {
    fn from(line: &OrderLine) -> Self {
        Self {
            instrument_id: line.instrument_id().to_string(),
            quantity: line.quantity().get(),
            unit_price: line.unit_price(),
            subtotal: line.subtotal(),
        }
    }
}

/// DTO representing one status event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEventDto {
    /// Status label.
    pub status: String,
    /// When it was recorded.
    pub recorded_at: Timestamp,
}

impl From<&StatusEvent> for StatusEventDto {
    fn from(event: &StatusEvent) -> Self {
        Self {
            status: event.status().to_string(),
            recorded_at: event.recorded_at(),
        }
    }
}

/// DTO representing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDto {
    /// Order ID.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Placement time.
    pub created_at: Timestamp,
    /// Current status.
    pub status: String,
    /// Sum of line subtotals.
    pub total: Money,
    /// Lines in insertion order.
    pub lines: Vec<OrderLineDto>,
    /// Status history, newest first.
    pub history: Vec<StatusEventDto>,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            created_at: order.created_at(),
            status: order.status().to_string(),
            total: order.total(),
            lines: order.lines().iter().map(OrderLineDto::from).collect(),
            history: order.history().iter().map(StatusEventDto::from).collect(),
        }
    }
}
