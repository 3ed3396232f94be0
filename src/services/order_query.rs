use std::sync::Arc;
use uuid::Uuid;

use crate::domain::catalog::CatalogLookup;
use crate::domain::order::{OrderAggregate, OrderError, OrderEvent, OrderState};
use crate::event_sourcing::EventEnvelope;
use crate::persistence::OrderRepository;
use super::views::OrderView;

/// Read access to placed orders and their journals. Carts never show up here.
pub struct OrderQuery {
    catalog: Arc<dyn CatalogLookup>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderQuery {
    pub fn new(catalog: Arc<dyn CatalogLookup>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { catalog, orders }
    }

    pub async fn get_orders_by_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, OrderError> {
        self.catalog
            .find_active_user(user_id)
            .await?
            .ok_or(OrderError::UserNotFound(user_id))?;

        let orders = self.orders.find_by_user(user_id).await?;
        Ok(placed_views(orders))
    }

    /// Orders of a store; only its owner may list them
    pub async fn get_orders_by_store(&self, acting_user_id: Uuid, store_id: Uuid) -> Result<Vec<OrderView>, OrderError> {
        let store = self
            .catalog
            .find_active_store(store_id)
            .await?
            .ok_or(OrderError::StoreNotFound(store_id))?;
        if store.owner_id != acting_user_id {
            tracing::warn!(store_id = %store_id, user_id = %acting_user_id, "Store orders requested by non-owner");
            return Err(OrderError::NotStoreOwner(store_id));
        }

        let orders = self.orders.find_by_store(store_id).await?;
        Ok(placed_views(orders))
    }

    /// Event journal of an order, visible to its customer and the store owner
    pub async fn get_order_history(
        &self,
        acting_user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<EventEnvelope<OrderEvent>>, OrderError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.user_id != acting_user_id {
            let owner_id = self.catalog.find_store(order.store_id).await?.map(|s| s.owner_id);
            if owner_id != Some(acting_user_id) {
                return Err(OrderError::InvalidRole);
            }
        }

        Ok(self.orders.load_events(order_id).await?)
    }
}

fn placed_views(orders: Vec<OrderAggregate>) -> Vec<OrderView> {
    orders
        .iter()
        .filter(|o| o.state != OrderState::Cart)
        .map(OrderView::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::Aggregate;
    use crate::domain::ErrorKind;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn test_user_orders_exclude_cart() {
        let fx = Fixture::new().await;
        let placed = fx.placed_order().await;
        fx.carts.add_to_cart(fx.customer.id, fx.tangsuyuk.id, vec![]).await.unwrap();

        let orders = fx.queries.get_orders_by_user(fx.customer.id).await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, placed.order_id);
        assert_eq!(orders[0].total_price, 18_000);
    }

    #[tokio::test]
    async fn test_store_orders_for_owner_only() {
        let fx = Fixture::new().await;
        fx.placed_order().await;

        let orders = fx.queries.get_orders_by_store(fx.owner.id, fx.chinese.id).await.unwrap();
        assert_eq!(orders.len(), 1);

        let err = fx.queries.get_orders_by_store(fx.customer.id, fx.chinese.id).await.unwrap_err();
        assert!(matches!(err, OrderError::NotStoreOwner(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRole);
    }

    #[tokio::test]
    async fn test_deleted_store_has_no_order_list() {
        let fx = Fixture::new().await;
        fx.placed_order().await;

        let mut deleted = fx.chinese.clone();
        deleted.deleted = true;
        fx.catalog.insert_store(deleted).await;

        let err = fx.queries.get_orders_by_store(fx.owner.id, fx.chinese.id).await.unwrap_err();
        assert!(matches!(err, OrderError::StoreNotFound(id) if id == fx.chinese.id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_permanently_closed_store_still_lists_orders() {
        let fx = Fixture::new().await;
        fx.placed_order().await;

        let mut closed = fx.chinese.clone();
        closed.status = crate::domain::catalog::StoreStatus::PermanentlyClosed;
        fx.catalog.insert_store(closed).await;

        let orders = fx.queries.get_orders_by_store(fx.owner.id, fx.chinese.id).await.unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_history_replays_to_current_state() {
        let fx = Fixture::new().await;
        let placed = fx.placed_order().await;
        fx.order_service.update_order_state(fx.owner.id, placed.order_id, OrderState::Accepted).await.unwrap();

        let history = fx.queries.get_order_history(fx.owner.id, placed.order_id).await.unwrap();
        let types: Vec<_> = history.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["CartOpened", "MenuAdded", "OrderPlaced", "OrderStateChanged"]);

        let replayed = OrderAggregate::load_from_events(history).unwrap();
        let stored = fx.orders.find_by_id(placed.order_id).await.unwrap().unwrap();
        assert_eq!(replayed, stored);
        assert_eq!(replayed.version(), 4);
    }

    #[tokio::test]
    async fn test_history_hidden_from_strangers() {
        let fx = Fixture::new().await;
        let placed = fx.placed_order().await;

        let err = fx.queries.get_order_history(fx.other_customer.id, placed.order_id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidRole));
        assert!(fx.queries.get_order_history(fx.customer.id, placed.order_id).await.is_ok());
    }
}
