use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveTime, Utc};

use crate::domain::catalog::{Store, StoreStatus};
use crate::event_sourcing::Aggregate;
use super::value_objects::{OrderMenu, OrderState};
use super::events::*;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::transitions::{rule_for, Party};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// One aggregate covers the whole life of an order: the mutable cart first,
// then the placed order moving through the lifecycle. Line items are owned
// by the order, options by their line item.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State (derived from events)
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub state: OrderState,
    pub order_menus: Vec<OrderMenu>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAggregate {
    /// Start a new cart. Returns the aggregate together with its first event,
    /// which the caller persists along with whatever follows it.
    pub fn open_cart(order_id: Uuid, user_id: Uuid, store_id: Uuid, at: DateTime<Utc>) -> (Self, OrderEvent) {
        let event = OrderEvent::CartOpened(CartOpened { user_id, store_id, opened_at: at });
        let aggregate = Self {
            id: order_id,
            version: 0,
            user_id,
            store_id,
            state: OrderState::Cart,
            order_menus: Vec::new(),
            created_at: at,
            updated_at: at,
        };
        (aggregate, event)
    }

    /// Sum over line items of base price plus selected option prices,
    /// saturating at `u64::MAX`
    pub fn total_price(&self) -> u64 {
        self.order_menus
            .iter()
            .fold(0u64, |total, m| total.saturating_add(m.line_total()))
    }

    pub fn is_cart(&self) -> bool {
        self.state == OrderState::Cart
    }

    fn ensure_cart(&self) -> Result<(), OrderError> {
        if self.is_cart() {
            Ok(())
        } else {
            Err(OrderError::NotACart(self.state))
        }
    }

    fn handle_add_menu(&self, store_id: Uuid, order_menu: &OrderMenu, at: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_cart()?;

        let mut events = Vec::with_capacity(2);
        if store_id != self.store_id {
            events.push(OrderEvent::CartReset(CartReset {
                previous_store_id: self.store_id,
                store_id,
                discarded_items: self.order_menus.len(),
                reset_at: at,
            }));
        }
        events.push(OrderEvent::MenuAdded(MenuAdded {
            order_menu: order_menu.clone(),
            added_at: at,
        }));
        Ok(events)
    }

    fn handle_remove_menu(&self, order_menu_id: Uuid, at: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_cart()?;

        if !self.order_menus.iter().any(|m| m.id == order_menu_id) {
            return Err(OrderError::CartItemNotFound(order_menu_id));
        }

        Ok(vec![OrderEvent::MenuRemoved(MenuRemoved { order_menu_id, removed_at: at })])
    }

    fn handle_expire(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> Vec<OrderEvent> {
        if !self.is_cart() || self.order_menus.is_empty() {
            return Vec::new();
        }

        if now.signed_duration_since(self.updated_at) < ttl {
            return Vec::new();
        }

        vec![OrderEvent::CartCleared(CartCleared {
            cleared_items: self.order_menus.len(),
            cleared_at: now,
        })]
    }

    fn handle_place(&self, store: &Store, local_time: NaiveTime, at: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_cart()?;

        if self.order_menus.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        if store.status == StoreStatus::PermanentlyClosed {
            return Err(OrderError::StoreAlreadyClosed(store.id));
        }

        if !store.hours.is_open_at(local_time) {
            return Err(OrderError::OrderClosed);
        }

        let total_price = self.total_price();
        if total_price < store.minimum_order_price {
            return Err(OrderError::OrderTooCheap {
                total: total_price,
                minimum: store.minimum_order_price,
            });
        }

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced { total_price, placed_at: at })])
    }

    fn handle_change_state(
        &self,
        requested: OrderState,
        actor_id: Uuid,
        store_owner_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let rule = rule_for(requested).ok_or(OrderError::UnsupportedTransition(requested))?;

        // Actor first: a wrong actor never learns about the order's state.
        let allowed_user = match rule.allowed {
            Party::Customer => self.user_id,
            Party::StoreOwner => store_owner_id,
        };
        if actor_id != allowed_user {
            return Err(OrderError::InvalidRole);
        }

        if self.state != rule.from {
            return Err((rule.reject)(self.state));
        }

        Ok(vec![OrderEvent::StateChanged(OrderStateChanged {
            from: self.state,
            to: requested,
            changed_by: actor_id,
            changed_at: at,
        })])
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::CartOpened(e) => {
                let (aggregate, _) = Self::open_cart(aggregate_id, e.user_id, e.store_id, e.opened_at);
                Ok(aggregate)
            }
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::CartOpened(_) => return Err(OrderError::NotInitialized),
            OrderEvent::MenuAdded(e) => {
                self.order_menus.push(e.order_menu.clone());
            }
            OrderEvent::CartReset(e) => {
                self.order_menus.clear();
                self.store_id = e.store_id;
            }
            OrderEvent::MenuRemoved(e) => {
                self.order_menus.retain(|m| m.id != e.order_menu_id);
            }
            OrderEvent::CartCleared(_) => {
                self.order_menus.clear();
            }
            OrderEvent::OrderPlaced(_) => {
                self.state = OrderState::Pending;
            }
            OrderEvent::StateChanged(e) => {
                self.state = e.to;
            }
        }

        self.updated_at = event.occurred_at();
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::AddMenu { store_id, order_menu, at } => {
                self.handle_add_menu(*store_id, order_menu, *at)
            }
            OrderCommand::RemoveMenu { order_menu_id, at } => {
                self.handle_remove_menu(*order_menu_id, *at)
            }
            OrderCommand::ExpireCart { now, ttl } => Ok(self.handle_expire(*now, *ttl)),
            OrderCommand::PlaceOrder { store, local_time, at } => {
                self.handle_place(store, *local_time, *at)
            }
            OrderCommand::ChangeState { requested, actor_id, store_owner_id, at } => {
                self.handle_change_state(*requested, *actor_id, *store_owner_id, *at)
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
