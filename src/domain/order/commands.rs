use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::Store;
use super::value_objects::{OrderMenu, OrderState};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    /// Append a line item; a menu from another store resets the cart first
    AddMenu {
        store_id: Uuid,
        order_menu: OrderMenu,
        at: DateTime<Utc>,
    },
    RemoveMenu {
        order_menu_id: Uuid,
        at: DateTime<Utc>,
    },
    /// Empty the cart if it was untouched for at least `ttl`
    ExpireCart {
        now: DateTime<Utc>,
        ttl: Duration,
    },
    PlaceOrder {
        store: Store,
        /// Store-local time of day the order is placed at
        local_time: NaiveTime,
        at: DateTime<Utc>,
    },
    ChangeState {
        requested: OrderState,
        actor_id: Uuid,
        store_owner_id: Uuid,
        at: DateTime<Utc>,
    },
}
