// ============================================================================
// Persistence - repository seams for orders and reviews
// ============================================================================
//
// Orders are stored as a snapshot plus the journal of events that produced
// it. Both are written together; `save` checks the stored version first
// (optimistic concurrency) and refuses a second CART for the same user.
//
// ============================================================================

mod memory;
mod scylla_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{OrderAggregate, OrderEvent};
use crate::domain::review::Review;
use crate::event_sourcing::EventEnvelope;

pub use memory::{InMemoryOrderRepository, InMemoryReviewRepository};
pub use scylla_store::{connect, ScyllaOrderRepository, ScyllaReviewRepository};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Serialization(e.to_string())
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError>;

    /// The user's order in state CART, if any
    async fn find_cart_by_user(&self, user_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError>;

    /// Every order of the user, carts included
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError>;

    /// Every order of the store, carts included
    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError>;

    /// Every order currently in state CART
    async fn find_carts(&self) -> Result<Vec<OrderAggregate>, RepositoryError>;

    /// Store the snapshot and append `events` to the order's journal.
    ///
    /// `expected_version` is the version the events were decided against;
    /// zero for a new order.
    async fn save(
        &self,
        order: &OrderAggregate,
        expected_version: i64,
        events: Vec<EventEnvelope<OrderEvent>>,
    ) -> Result<(), RepositoryError>;

    /// Journal of an order in sequence order; empty if the order is unknown
    async fn load_events(&self, order_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, RepositoryError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with `Conflict` if the order already has a review
    async fn save(&self, review: &Review) -> Result<(), RepositoryError>;

    async fn exists_for_order(&self, order_id: Uuid) -> Result<bool, RepositoryError>;

    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<Review>, RepositoryError>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Review>, RepositoryError>;
}
