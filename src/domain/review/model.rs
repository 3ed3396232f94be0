use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderAggregate;
use super::errors::ReviewError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A customer's review of one completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub rating: u8,
    pub content: Option<String>,
    /// Names of the ordered menus, copied from the order's line items
    pub menu_names: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Build a review for `order`. Ownership and order state are checked by
    /// the caller; only the rating range is checked here.
    pub fn for_order(
        order: &OrderAggregate,
        rating: u8,
        content: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::InvalidRating(rating));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            user_id: order.user_id,
            store_id: order.store_id,
            rating,
            content,
            menu_names: order.order_menus.iter().map(|m| m.name.clone()).collect(),
            created_at,
        })
    }
}

/// Inclusive rating bounds for store review listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingFilter {
    pub min: Option<u8>,
    pub max: Option<u8>,
}

impl RatingFilter {
    pub fn new(min: Option<u8>, max: Option<u8>) -> Self {
        Self { min, max }
    }

    pub fn matches(&self, rating: u8) -> bool {
        self.min.map_or(true, |min| rating >= min) && self.max.map_or(true, |max| rating <= max)
    }
}
