use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::{OrderAggregate, OrderEvent, OrderState};
use crate::domain::review::Review;
use crate::event_sourcing::EventEnvelope;
use super::{OrderRepository, RepositoryError, ReviewRepository};

// ============================================================================
// In-memory repositories
// ============================================================================
//
// Used when no ScyllaDB node is configured and by every service test. A single
// write lock covers the version check and the write, so `save` is atomic.
//
// ============================================================================

#[derive(Default)]
struct OrderTables {
    orders: HashMap<Uuid, OrderAggregate>,
    journals: HashMap<Uuid, Vec<EventEnvelope<OrderEvent>>>,
}

#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut orders: Vec<OrderAggregate>) -> Vec<OrderAggregate> {
        orders.sort_by_key(|o| o.created_at);
        orders
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn find_cart_by_user(&self, user_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.user_id == user_id && o.state == OrderState::Cart)
            .cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
        let tables = self.tables.read().await;
        let orders = tables.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
        Ok(Self::sorted(orders))
    }

    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
        let tables = self.tables.read().await;
        let orders = tables.orders.values().filter(|o| o.store_id == store_id).cloned().collect();
        Ok(Self::sorted(orders))
    }

    async fn find_carts(&self) -> Result<Vec<OrderAggregate>, RepositoryError> {
        let tables = self.tables.read().await;
        let orders = tables.orders.values().filter(|o| o.state == OrderState::Cart).cloned().collect();
        Ok(Self::sorted(orders))
    }

    async fn save(
        &self,
        order: &OrderAggregate,
        expected_version: i64,
        events: Vec<EventEnvelope<OrderEvent>>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;

        let current_version = tables.orders.get(&order.id).map_or(0, |o| o.version);
        if current_version != expected_version {
            return Err(RepositoryError::Conflict(format!(
                "order {}: expected version {}, but current is {}",
                order.id, expected_version, current_version
            )));
        }

        if order.state == OrderState::Cart {
            let other_cart = tables
                .orders
                .values()
                .any(|o| o.id != order.id && o.user_id == order.user_id && o.state == OrderState::Cart);
            if other_cart {
                return Err(RepositoryError::Conflict(format!(
                    "user {} already has an open cart",
                    order.user_id
                )));
            }
        }

        tables.orders.insert(order.id, order.clone());
        tables.journals.entry(order.id).or_default().extend(events);
        Ok(())
    }

    async fn load_events(&self, order_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.journals.get(&order_id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryReviewRepository {
    reviews: Arc<RwLock<Vec<Review>>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn save(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut reviews = self.reviews.write().await;
        if reviews.iter().any(|r| r.order_id == review.order_id) {
            return Err(RepositoryError::Conflict(format!("order {} already reviewed", review.order_id)));
        }
        reviews.push(review.clone());
        Ok(())
    }

    async fn exists_for_order(&self, order_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.reviews.read().await.iter().any(|r| r.order_id == order_id))
    }

    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().filter(|r| r.store_id == store_id).cloned().collect())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }
}
