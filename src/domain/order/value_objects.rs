use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;

use crate::domain::catalog::{Menu, OptionItem};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Lifecycle state of an order. `Cart` is the only mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Cart,
    Pending,
    Accepted,
    Rejected,
    Delivery,
    Completed,
    Canceled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Cart => "CART",
            OrderState::Pending => "PENDING",
            OrderState::Accepted => "ACCEPTED",
            OrderState::Rejected => "REJECTED",
            OrderState::Delivery => "DELIVERY",
            OrderState::Completed => "COMPLETED",
            OrderState::Canceled => "CANCELED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Rejected | OrderState::Canceled | OrderState::Completed)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a selected option item, copied at selection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMenuOption {
    pub option_item_id: Uuid,
    pub name: String,
    pub additional_price: u64,
}

impl OrderMenuOption {
    pub fn from_item(item: &OptionItem) -> Self {
        Self {
            option_item_id: item.id,
            name: item.name.clone(),
            additional_price: item.additional_price,
        }
    }
}

/// Line item: snapshot of a menu plus its selected options.
///
/// Name and price are copied so later menu edits never rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMenu {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub name: String,
    pub price: u64,
    pub options: Vec<OrderMenuOption>,
}

impl OrderMenu {
    pub fn snapshot(id: Uuid, menu: &Menu, options: Vec<OrderMenuOption>) -> Self {
        Self {
            id,
            menu_id: menu.id,
            name: menu.name.clone(),
            price: menu.price,
            options,
        }
    }

    /// Base price plus every selected option's additional price, saturating
    /// at `u64::MAX`
    pub fn line_total(&self) -> u64 {
        self.options
            .iter()
            .fold(self.price, |total, o| total.saturating_add(o.additional_price))
    }
}

/// Requested items for one option category of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub option_category_id: Uuid,
    pub option_item_ids: Vec<Uuid>,
}

impl OptionSelection {
    pub fn new(option_category_id: Uuid, option_item_ids: Vec<Uuid>) -> Self {
        Self { option_category_id, option_item_ids }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
