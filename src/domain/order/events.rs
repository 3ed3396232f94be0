use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::DomainEvent;
use super::value_objects::{OrderMenu, OrderState};

// ============================================================================
// Order Events - Domain Events for the Order Aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    CartOpened(CartOpened),
    MenuAdded(MenuAdded),
    CartReset(CartReset),
    MenuRemoved(MenuRemoved),
    CartCleared(CartCleared),
    OrderPlaced(OrderPlaced),
    StateChanged(OrderStateChanged),
}

impl OrderEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::CartOpened(e) => e.opened_at,
            OrderEvent::MenuAdded(e) => e.added_at,
            OrderEvent::CartReset(e) => e.reset_at,
            OrderEvent::MenuRemoved(e) => e.removed_at,
            OrderEvent::CartCleared(e) => e.cleared_at,
            OrderEvent::OrderPlaced(e) => e.placed_at,
            OrderEvent::StateChanged(e) => e.changed_at,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::CartOpened(_) => "CartOpened",
            OrderEvent::MenuAdded(_) => "MenuAdded",
            OrderEvent::CartReset(_) => "CartReset",
            OrderEvent::MenuRemoved(_) => "MenuRemoved",
            OrderEvent::CartCleared(_) => "CartCleared",
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::StateChanged(_) => "OrderStateChanged",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Cart Opened - first event of every order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CartOpened {
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub opened_at: DateTime<Utc>,
}

/// Menu Added - a line item snapshot was appended to the cart
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuAdded {
    pub order_menu: OrderMenu,
    pub added_at: DateTime<Utc>,
}

/// Cart Reset - a menu from another store discarded the cart's items
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CartReset {
    pub previous_store_id: Uuid,
    pub store_id: Uuid,
    pub discarded_items: usize,
    pub reset_at: DateTime<Utc>,
}

/// Menu Removed - customer dropped a line item
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuRemoved {
    pub order_menu_id: Uuid,
    pub removed_at: DateTime<Utc>,
}

/// Cart Cleared - stale cart emptied by the daily sweep
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CartCleared {
    pub cleared_items: usize,
    pub cleared_at: DateTime<Utc>,
}

/// Order Placed - cart became a pending order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPlaced {
    pub total_price: u64,
    pub placed_at: DateTime<Utc>,
}

/// Order State Changed - lifecycle transition after placement
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStateChanged {
    pub from: OrderState,
    pub to: OrderState,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}
