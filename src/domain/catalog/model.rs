use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog Models - read-only to the order engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Customer,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub deleted: bool,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            deleted: false,
        }
    }

    pub fn is_customer(&self) -> bool {
        self.role == UserRole::Customer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreStatus {
    Open,
    ClosedByTime,
    PermanentlyClosed,
}

/// Daily opening window, both ends inclusive.
///
/// `open > close` wraps past midnight; `open == close` means open all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl BusinessHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        if self.open < self.close {
            self.open <= time && time <= self.close
        } else if self.open > self.close {
            time >= self.open || time <= self.close
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub hours: BusinessHours,
    pub minimum_order_price: u64,
    pub status: StoreStatus,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub price: u64,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: Uuid,
    pub name: String,
    pub additional_price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCategory {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub name: String,
    pub required: bool,
    pub multiple: bool,
    /// `None` = unbounded
    pub max_options: Option<u32>,
    pub items: Vec<OptionItem>,
}

impl OptionCategory {
    pub fn item(&self, item_id: Uuid) -> Option<&OptionItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
