use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::catalog::CatalogLookup;
use crate::domain::order::{
    validate_selections, OptionSelection, OrderAggregate, OrderCommand, OrderCommandHandler, OrderError,
    OrderEvent, OrderMenu,
};
use crate::event_sourcing::Aggregate;
use crate::metrics::Metrics;
use crate::persistence::OrderRepository;
use super::locks::UserLocks;
use super::views::CartView;

// ============================================================================
// Cart Manager
// ============================================================================
//
// Owns the single open cart of each user. Every mutation runs under the
// user's lock: read the cart, decide, write snapshot and events together.
//
// ============================================================================

/// Outcome of one cart sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Carts looked at
    pub examined: usize,
    /// Carts emptied
    pub expired: usize,
    /// Carts that could not be processed
    pub failed: usize,
}

pub struct CartManager {
    catalog: Arc<dyn CatalogLookup>,
    orders: Arc<dyn OrderRepository>,
    handler: OrderCommandHandler,
    locks: UserLocks,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    cart_ttl: Duration,
}

impl CartManager {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        orders: Arc<dyn OrderRepository>,
        locks: UserLocks,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        cart_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            handler: OrderCommandHandler::new(orders.clone()),
            orders,
            locks,
            clock,
            metrics,
            cart_ttl,
        }
    }

    /// Add a menu with its option selections to the user's cart, opening a
    /// cart if the user has none.
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        menu_id: Uuid,
        selections: Vec<OptionSelection>,
    ) -> Result<CartView, OrderError> {
        self.try_add_to_cart(user_id, menu_id, selections)
            .await
            .inspect_err(|e| self.rejected("add_to_cart", user_id, e))
    }

    async fn try_add_to_cart(
        &self,
        user_id: Uuid,
        menu_id: Uuid,
        selections: Vec<OptionSelection>,
    ) -> Result<CartView, OrderError> {
        let user = self
            .catalog
            .find_active_user(user_id)
            .await?
            .ok_or(OrderError::UserNotFound(user_id))?;
        if !user.is_customer() {
            return Err(OrderError::UserOnlyAccess);
        }

        let menu = self
            .catalog
            .find_active_menu(menu_id)
            .await?
            .ok_or(OrderError::MenuNotFound(menu_id))?;

        let categories = self.catalog.find_option_categories(menu_id).await?;
        let options = validate_selections(&categories, &selections)?;
        let order_menu = OrderMenu::snapshot(Uuid::new_v4(), &menu, options);

        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();
        let correlation_id = Uuid::new_v4();
        let command = OrderCommand::AddMenu { store_id: menu.store_id, order_menu, at: now };

        let (cart, events) = match self.orders.find_cart_by_user(user_id).await? {
            Some(mut cart) => {
                let events = self.handler.handle(&mut cart, &command, user_id, correlation_id).await?;
                (cart, events)
            }
            None => {
                let (mut cart, opened) = OrderAggregate::open_cart(Uuid::now_v7(), user_id, menu.store_id, now);
                let mut events = vec![opened];
                events.extend(cart.execute(&command)?);
                self.handler.commit(&mut cart, 0, events.clone(), user_id, correlation_id).await?;
                tracing::debug!(order_id = %cart.id, user_id = %user_id, "Opened cart");
                (cart, events)
            }
        };

        let reset = events.iter().find_map(|e| match e {
            OrderEvent::CartReset(reset) => Some(reset),
            _ => None,
        });
        if let Some(reset) = reset {
            self.metrics.carts_reset.inc();
            tracing::info!(
                order_id = %cart.id,
                previous_store_id = %reset.previous_store_id,
                store_id = %reset.store_id,
                discarded_items = reset.discarded_items,
                "Cart reset for menu from another store"
            );
        }

        self.metrics.cart_items_added.inc();
        tracing::info!(order_id = %cart.id, user_id = %user_id, menu_id = %menu_id, "Menu added to cart");

        Ok(CartView::from(&cart))
    }

    /// Remove one line item from the user's cart
    pub async fn remove_cart_item(&self, user_id: Uuid, order_menu_id: Uuid) -> Result<CartView, OrderError> {
        self.try_remove_cart_item(user_id, order_menu_id)
            .await
            .inspect_err(|e| self.rejected("remove_cart_item", user_id, e))
    }

    async fn try_remove_cart_item(&self, user_id: Uuid, order_menu_id: Uuid) -> Result<CartView, OrderError> {
        let _guard = self.locks.acquire(user_id).await;

        let mut cart = self
            .orders
            .find_cart_by_user(user_id)
            .await?
            .ok_or(OrderError::CartNotFound(user_id))?;

        let command = OrderCommand::RemoveMenu { order_menu_id, at: self.clock.now() };
        self.handler.handle(&mut cart, &command, user_id, Uuid::new_v4()).await?;

        self.metrics.cart_items_removed.inc();
        tracing::info!(order_id = %cart.id, order_menu_id = %order_menu_id, "Menu removed from cart");

        Ok(CartView::from(&cart))
    }

    /// Current cart of the user; an empty view when there is none
    pub async fn get_cart_items(&self, user_id: Uuid) -> Result<CartView, OrderError> {
        let cart = self.orders.find_cart_by_user(user_id).await?;
        Ok(cart.as_ref().map_or_else(CartView::empty, CartView::from))
    }

    /// Empty every cart untouched for at least the configured TTL.
    ///
    /// A failure on one cart is logged and counted; the sweep carries on with
    /// the remaining carts.
    pub async fn expire_stale_carts(&self) -> Result<SweepReport, OrderError> {
        let started = Instant::now();
        let now = self.clock.now();
        let carts = self.orders.find_carts().await?;

        let mut report = SweepReport::default();
        for cart in carts {
            report.examined += 1;
            match self.expire_cart(cart.id, cart.user_id, now).await {
                Ok(true) => report.expired += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    self.metrics.sweep_failures.inc();
                    tracing::error!(order_id = %cart.id, error = %e, code = e.code(), "Failed to expire cart");
                }
            }
        }

        self.metrics.carts_expired.inc_by(report.expired as u64);
        self.metrics.sweep_duration.observe(started.elapsed().as_secs_f64());
        tracing::info!(
            examined = report.examined,
            expired = report.expired,
            failed = report.failed,
            "Cart sweep finished"
        );

        Ok(report)
    }

    async fn expire_cart(&self, order_id: Uuid, user_id: Uuid, now: chrono::DateTime<chrono::Utc>) -> Result<bool, OrderError> {
        let _guard = self.locks.acquire(user_id).await;

        // Re-read under the lock; the cart may have changed since the scan
        let Some(mut cart) = self.orders.find_by_id(order_id).await? else {
            return Ok(false);
        };

        let command = OrderCommand::ExpireCart { now, ttl: self.cart_ttl };
        let events = self.handler.handle(&mut cart, &command, user_id, Uuid::new_v4()).await?;
        if events.is_empty() {
            return Ok(false);
        }

        tracing::debug!(order_id = %cart.id, user_id = %user_id, "Stale cart emptied");
        Ok(true)
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

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use crate::domain::order::OrderState;
    use crate::domain::ErrorKind;
    use crate::event_sourcing::EventEnvelope;
    use crate::persistence::{InMemoryOrderRepository, RepositoryError};
    use crate::test_support::Fixture;

    /// Order store whose writes fail for one chosen user
    struct FailingWrites {
        inner: InMemoryOrderRepository,
        failing_user: Mutex<Option<Uuid>>,
    }

    #[async_trait]
    impl OrderRepository for FailingWrites {
        async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
            self.inner.find_by_id(order_id).await
        }

        async fn find_cart_by_user(&self, user_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
            self.inner.find_cart_by_user(user_id).await
        }

        async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
            self.inner.find_by_user(user_id).await
        }

        async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
            self.inner.find_by_store(store_id).await
        }

        async fn find_carts(&self) -> Result<Vec<OrderAggregate>, RepositoryError> {
            self.inner.find_carts().await
        }

        async fn save(
            &self,
            order: &OrderAggregate,
            expected_version: i64,
            events: Vec<EventEnvelope<OrderEvent>>,
        ) -> Result<(), RepositoryError> {
            let failing_user = *self.failing_user.lock().unwrap();
            if failing_user == Some(order.user_id) {
                return Err(RepositoryError::Backend("write timeout".to_string()));
            }
            self.inner.save(order, expected_version, events).await
        }

        async fn load_events(&self, order_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, RepositoryError> {
            self.inner.load_events(order_id).await
        }
    }

    #[tokio::test]
    async fn test_first_add_opens_cart_at_menu_store() {
        let fx = Fixture::new().await;

        let view = fx.carts.add_to_cart(fx.customer.id, fx.jjajang.id, fx.jjajang_selection()).await.unwrap();

        assert_eq!(view.store_id, Some(fx.chinese.id));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].name, "Jjajangmyeon");
        assert_eq!(view.total_price, 8_000 + 1_000);
    }

    #[tokio::test]
    async fn test_second_add_appends_to_same_cart() {
        let fx = Fixture::new().await;

        let first = fx.carts.add_to_cart(fx.customer.id, fx.jjajang.id, fx.jjajang_selection()).await.unwrap();
        let second = fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();

        assert_eq!(first.order_id, second.order_id);
        assert_eq!(second.items.len(), 2);
    }

    #[tokio::test]
    async fn test_menu_from_other_store_resets_cart() {
        let fx = Fixture::new().await;

        fx.carts.add_to_cart(fx.customer.id, fx.jjajang.id, fx.jjajang_selection()).await.unwrap();
        let view = fx.carts.add_to_cart(fx.customer.id, fx.bibimbap.id, vec![]).await.unwrap();

        assert_eq!(view.store_id, Some(fx.korean.id));
        let names: Vec<_> = view.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bibimbap"]);
        assert_eq!(fx.metrics.carts_reset.get(), 1);
    }

    #[tokio::test]
    async fn test_owner_cannot_use_cart() {
        let fx = Fixture::new().await;

        let err = fx.carts.add_to_cart(fx.owner.id, fx.tangsuyuk.id, vec![]).await.unwrap_err();

        assert!(matches!(err, OrderError::UserOnlyAccess));
        assert_eq!(err.kind(), ErrorKind::InvalidRole);
    }

    #[tokio::test]
    async fn test_unknown_user_and_menu() {
        let fx = Fixture::new().await;

        let err = fx.carts.add_to_cart(Uuid::new_v4(), fx.tangsuyuk.id, vec![]).await.unwrap_err();
        assert!(matches!(err, OrderError::UserNotFound(_)));

        let err = fx.carts.add_to_cart(fx.customer.id, Uuid::new_v4(), vec![]).await.unwrap_err();
        assert!(matches!(err, OrderError::MenuNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_selection_leaves_cart_unchanged() {
        let fx = Fixture::new().await;
        fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        let before = fx.carts.get_cart_items(fx.customer.id).await.unwrap();

        // Size is required
        let err = fx
            .carts
            .add_to_cart(fx.customer.id, fx.jjajang.id, vec![OptionSelection::new(fx.jjajang_size.id, vec![])])
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::RequiredOptionNotSelected(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fx.carts.get_cart_items(fx.customer.id).await.unwrap(), before);
        assert_eq!(fx.metrics.requests_rejected.with_label_values(&["add_to_cart", "REQUIRED_OPTION_NOT_SELECTED"]).get(), 1);
    }

    #[tokio::test]
    async fn test_single_choice_category_rejects_two_items() {
        let fx = Fixture::new().await;
        let both: Vec<_> = fx.jjajang_size.items.iter().map(|i| i.id).collect();

        let err = fx
            .carts
            .add_to_cart(fx.customer.id, fx.jjajang.id, vec![OptionSelection::new(fx.jjajang_size.id, both)])
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::MultipleSelectionNotAllowed(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_remove_cart_item() {
        let fx = Fixture::new().await;
        let view = fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        let item_id = view.items[0].order_menu_id;

        let view = fx.carts.remove_cart_item(fx.customer.id, item_id).await.unwrap();
        assert!(view.is_empty());

        let err = fx.carts.remove_cart_item(fx.customer.id, item_id).await.unwrap_err();
        assert!(matches!(err, OrderError::CartItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_without_cart() {
        let fx = Fixture::new().await;
        let err = fx.carts.remove_cart_item(fx.customer.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, OrderError::CartNotFound(_)));
    }

    #[tokio::test]
    async fn test_cannot_remove_item_of_someone_elses_cart() {
        let fx = Fixture::new().await;
        let view = fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        fx.carts.add_to_cart(fx.other_customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();

        let err = fx
            .carts
            .remove_cart_item(fx.other_customer.id, view.items[0].order_menu_id)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::CartItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_cart_items_without_cart_is_empty_and_repeatable() {
        let fx = Fixture::new().await;
        assert_eq!(fx.carts.get_cart_items(fx.customer.id).await.unwrap(), CartView::empty());

        fx.carts.add_to_cart(fx.customer.id, fx.jjajang.id, fx.jjajang_selection()).await.unwrap();
        let first = fx.carts.get_cart_items(fx.customer.id).await.unwrap();
        let second = fx.carts.get_cart_items(fx.customer.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_one_cart() {
        let fx = Fixture::new().await;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let carts = fx.carts.clone();
            let (user_id, menu_id) = (fx.customer.id, fx.tangsuyuk.id);
            tasks.push(tokio::spawn(async move { carts.add_to_cart(user_id, menu_id, vec![]).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let orders = fx.orders.find_by_user(fx.customer.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_menus.len(), 8);
    }

    #[tokio::test]
    async fn test_sweep_clears_only_stale_carts() {
        let fx = Fixture::new().await;

        fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        fx.clock.advance(Duration::hours(20));
        fx.carts.add_to_cart(fx.other_customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        fx.clock.advance(Duration::hours(5));

        // customer: 25h old, other_customer: 5h old
        let report = fx.carts.expire_stale_carts().await.unwrap();

        assert_eq!(report, SweepReport { examined: 2, expired: 1, failed: 0 });
        assert!(fx.carts.get_cart_items(fx.customer.id).await.unwrap().is_empty());
        assert_eq!(fx.carts.get_cart_items(fx.other_customer.id).await.unwrap().items.len(), 1);

        let cart = fx.orders.find_cart_by_user(fx.customer.id).await.unwrap().unwrap();
        assert_eq!(cart.state, OrderState::Cart);
        assert_eq!(fx.metrics.carts_expired.get(), 1);
    }

    #[tokio::test]
    async fn test_sweep_continues_past_failed_cart() {
        let fx = Fixture::new().await;
        let orders = Arc::new(FailingWrites {
            inner: (*fx.orders).clone(),
            failing_user: Mutex::new(None),
        });
        let carts = CartManager::new(
            Arc::new(fx.catalog.clone()),
            orders.clone(),
            UserLocks::new(),
            fx.clock.clone(),
            fx.metrics.clone(),
            Duration::hours(24),
        );

        carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        carts.add_to_cart(fx.other_customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        fx.clock.advance(Duration::hours(25));
        *orders.failing_user.lock().unwrap() = Some(fx.customer.id);

        let report = carts.expire_stale_carts().await.unwrap();

        assert_eq!(report, SweepReport { examined: 2, expired: 1, failed: 1 });
        assert_eq!(fx.metrics.sweep_failures.get(), 1);
        assert_eq!(fx.metrics.carts_expired.get(), 1);
        assert_eq!(carts.get_cart_items(fx.customer.id).await.unwrap().items.len(), 1);
        assert!(carts.get_cart_items(fx.other_customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_threshold_is_inclusive() {
        let fx = Fixture::new().await;
        fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();

        fx.clock.advance(Duration::hours(24));
        let report = fx.carts.expire_stale_carts().await.unwrap();

        assert_eq!(report.expired, 1);
    }

    #[tokio::test]
    async fn test_sweep_skips_empty_carts() {
        let fx = Fixture::new().await;
        let view = fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();
        fx.carts.remove_cart_item(fx.customer.id, view.items[0].order_menu_id).await.unwrap();
        let version = fx.orders.find_cart_by_user(fx.customer.id).await.unwrap().unwrap().version;

        fx.clock.advance(Duration::days(3));
        let report = fx.carts.expire_stale_carts().await.unwrap();

        assert_eq!(report, SweepReport { examined: 1, expired: 0, failed: 0 });
        let cart = fx.orders.find_cart_by_user(fx.customer.id).await.unwrap().unwrap();
        assert_eq!(cart.version, version);
    }
}
