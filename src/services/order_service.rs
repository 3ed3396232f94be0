use chrono::FixedOffset;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{local_time_of_day, Clock};
use crate::domain::catalog::CatalogLookup;
use crate::domain::order::{OrderCommand, OrderCommandHandler, OrderError, OrderState};
use crate::metrics::Metrics;
use crate::persistence::OrderRepository;
use super::locks::UserLocks;
use super::views::OrderView;

// ============================================================================
// Order State Machine service
// ============================================================================
//
// Places carts and drives placed orders through their lifecycle. The rules
// live in the aggregate and the transition table; this service resolves the
// collaborators (user, store, owner, local time) and persists the outcome.
//
// ============================================================================

pub struct OrderService {
    catalog: Arc<dyn CatalogLookup>,
    orders: Arc<dyn OrderRepository>,
    handler: OrderCommandHandler,
    locks: UserLocks,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    business_utc_offset: FixedOffset,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        orders: Arc<dyn OrderRepository>,
        locks: UserLocks,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        business_utc_offset: FixedOffset,
    ) -> Self {
        Self {
            catalog,
            handler: OrderCommandHandler::new(orders.clone()),
            orders,
            locks,
            clock,
            metrics,
            business_utc_offset,
        }
    }

    /// Turn the user's cart into a pending order
    pub async fn create_order(&self, user_id: Uuid) -> Result<OrderView, OrderError> {
        self.try_create_order(user_id)
            .await
            .inspect_err(|e| self.rejected("create_order", user_id, e))
    }

    async fn try_create_order(&self, user_id: Uuid) -> Result<OrderView, OrderError> {
        let user = self
            .catalog
            .find_active_user(user_id)
            .await?
            .ok_or(OrderError::UserNotFound(user_id))?;
        if !user.is_customer() {
            return Err(OrderError::UserOnlyAccess);
        }

        let _guard = self.locks.acquire(user_id).await;

        let mut cart = self
            .orders
            .find_cart_by_user(user_id)
            .await?
            .ok_or(OrderError::CartNotFound(user_id))?;

        let store = self
            .catalog
            .find_active_store(cart.store_id)
            .await?
            .ok_or(OrderError::StoreNotFound(cart.store_id))?;

        let now = self.clock.now();
        let command = OrderCommand::PlaceOrder {
            store,
            local_time: local_time_of_day(now, self.business_utc_offset),
            at: now,
        };
        self.handler.handle(&mut cart, &command, user_id, Uuid::new_v4()).await?;

        self.metrics.orders_placed.inc();
        self.metrics.record_transition(OrderState::Cart.as_str(), cart.state.as_str());
        tracing::info!(
            order_id = %cart.id,
            store_id = %cart.store_id,
            total_price = cart.total_price(),
            "Order placed"
        );

        Ok(OrderView::from(&cart))
    }

    /// Move an order to `requested` on behalf of `acting_user_id`
    pub async fn update_order_state(
        &self,
        acting_user_id: Uuid,
        order_id: Uuid,
        requested: OrderState,
    ) -> Result<OrderView, OrderError> {
        self.try_update_order_state(acting_user_id, order_id, requested)
            .await
            .inspect_err(|e| self.rejected("update_order_state", acting_user_id, e))
    }

    async fn try_update_order_state(
        &self,
        acting_user_id: Uuid,
        order_id: Uuid,
        requested: OrderState,
    ) -> Result<OrderView, OrderError> {
        self.catalog
            .find_active_user(acting_user_id)
            .await?
            .ok_or(OrderError::UserNotFound(acting_user_id))?;

        let customer_id = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?
            .user_id;

        // Orders are mutated under their customer's lock; re-read once held
        let _guard = self.locks.acquire(customer_id).await;
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let store = self
            .catalog
            .find_store(order.store_id)
            .await?
            .ok_or(OrderError::StoreNotFound(order.store_id))?;

        let previous = order.state;
        let command = OrderCommand::ChangeState {
            requested,
            actor_id: acting_user_id,
            store_owner_id: store.owner_id,
            at: self.clock.now(),
        };
        self.handler.handle(&mut order, &command, acting_user_id, Uuid::new_v4()).await?;

        self.metrics.record_transition(previous.as_str(), order.state.as_str());
        tracing::info!(
            order_id = %order.id,
            store_id = %order.store_id,
            from = %previous,
            to = %order.state,
            "Order state changed"
        );

        Ok(OrderView::from(&order))
    }

    fn rejected(&self, operation: &'static str, user_id: Uuid, error: &OrderError) {
        self.metrics.record_rejection(operation, error.code());
        tracing::warn!(
            operation,
            user_id = %user_id,
            code = error.code(),
            kind = ?error.kind(),
            "Request rejected: {}",
            error
        );
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
