use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::serialize::row::SerializeRow;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;
use uuid::Uuid;
use anyhow::Context;

use crate::domain::order::{OrderAggregate, OrderEvent, OrderState};
use crate::domain::review::Review;
use crate::event_sourcing::{deserialize_event, serialize_event, EventEnvelope};
use super::{OrderRepository, RepositoryError, ReviewRepository};

// ============================================================================
// ScyllaDB repositories
// ============================================================================
//
// orders:  one row per order. `snapshot` holds the aggregate as JSON, the
//          user/store/state columns are denormalised for the secondary
//          indexes, `journal` is the list of serialized event envelopes.
//          Snapshot and journal are written by one conditional statement
//          (IF NOT EXISTS / IF version = ?), so a stale writer loses even
//          across processes. The one-cart-per-user check spans rows and is
//          a plain read; it relies on writers serializing per user.
// reviews: one row per review with the review as JSON.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        order_id uuid PRIMARY KEY,
        user_id uuid,
        store_id uuid,
        state text,
        version bigint,
        snapshot text,
        journal list<text>,
        updated_at timestamp
    )",
    "CREATE INDEX IF NOT EXISTS orders_by_user ON orders (user_id)",
    "CREATE INDEX IF NOT EXISTS orders_by_store ON orders (store_id)",
    "CREATE INDEX IF NOT EXISTS orders_by_state ON orders (state)",
    "CREATE TABLE IF NOT EXISTS reviews (
        review_id uuid PRIMARY KEY,
        order_id uuid,
        user_id uuid,
        store_id uuid,
        payload text
    )",
    "CREATE INDEX IF NOT EXISTS reviews_by_order ON reviews (order_id)",
    "CREATE INDEX IF NOT EXISTS reviews_by_user ON reviews (user_id)",
    "CREATE INDEX IF NOT EXISTS reviews_by_store ON reviews (store_id)",
];

/// Connect to `node`, create the keyspace and tables if missing and switch
/// the session to the keyspace.
pub async fn connect(node: &str, keyspace: &str) -> anyhow::Result<Arc<Session>> {
    tracing::info!(node, keyspace, "Connecting to ScyllaDB...");
    let session: Session = SessionBuilder::new()
        .known_node(node)
        .build()
        .await
        .with_context(|| format!("connecting to ScyllaDB at {}", node))?;

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                keyspace
            ),
            (),
        )
        .await
        .context("creating keyspace")?;

    session.use_keyspace(keyspace, false).await?;

    for statement in SCHEMA {
        session
            .query_unpaged(*statement, ())
            .await
            .with_context(|| format!("applying schema statement: {}", statement))?;
    }

    Ok(Arc::new(session))
}

fn backend<E: std::fmt::Display>(e: E) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}

// ============================================================================
// Row codec
// ============================================================================

fn encode_snapshot(order: &OrderAggregate) -> Result<String, RepositoryError> {
    serialize_event(order).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn decode_snapshot(json: &str) -> Result<OrderAggregate, RepositoryError> {
    deserialize_event(json).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn encode_journal(events: &[EventEnvelope<OrderEvent>]) -> Result<Vec<String>, RepositoryError> {
    events
        .iter()
        .map(|e| serialize_event(e).map_err(|e| RepositoryError::Serialization(e.to_string())))
        .collect()
}

fn decode_journal(entries: Vec<String>) -> Result<Vec<EventEnvelope<OrderEvent>>, RepositoryError> {
    let mut events = entries
        .iter()
        .map(|json| deserialize_event(json).map_err(|e| RepositoryError::Serialization(e.to_string())))
        .collect::<Result<Vec<EventEnvelope<OrderEvent>>, _>>()?;
    events.sort_by_key(|e| e.sequence_number);
    Ok(events)
}

// ============================================================================
// Orders
// ============================================================================

const INSERT_ORDER: &str = "INSERT INTO orders \
    (order_id, user_id, store_id, state, version, snapshot, journal, updated_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS";

const UPDATE_ORDER: &str = "UPDATE orders SET user_id = ?, store_id = ?, state = ?, version = ?, \
    snapshot = ?, updated_at = ?, journal = journal + ? WHERE order_id = ? IF version = ?";

pub struct ScyllaOrderRepository {
    session: Arc<Session>,
}

impl ScyllaOrderRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn select_snapshots(&self, query: &str, key: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
        let result = self.session.query_unpaged(query, (key,)).await.map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        let mut orders = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(backend)? {
            let (snapshot,) = row.map_err(backend)?;
            orders.push(decode_snapshot(&snapshot)?);
        }
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Run a lightweight transaction and report whether it was applied
    async fn write_if(&self, statement: &str, values: impl SerializeRow) -> Result<bool, RepositoryError> {
        let result = self.session.query_unpaged(statement, values).await.map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        // First column of an LWT result is `[applied]`
        let applied = rows_result
            .maybe_first_row::<Row>()
            .map_err(backend)?
            .and_then(|row| row.columns.into_iter().next().flatten());
        Ok(matches!(applied, Some(CqlValue::Boolean(true))))
    }

    async fn other_cart_exists(&self, order: &OrderAggregate) -> Result<bool, RepositoryError> {
        let result = self
            .session
            .query_unpaged("SELECT order_id, state FROM orders WHERE user_id = ?", (order.user_id,))
            .await
            .map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        for row in rows_result.rows::<(Uuid, Option<String>)>().map_err(backend)? {
            let (order_id, state) = row.map_err(backend)?;
            if order_id != order.id && state.as_deref() == Some(OrderState::Cart.as_str()) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl OrderRepository for ScyllaOrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
        let mut orders = self
            .select_snapshots("SELECT snapshot FROM orders WHERE order_id = ?", order_id)
            .await?;
        Ok(orders.pop())
    }

    async fn find_cart_by_user(&self, user_id: Uuid) -> Result<Option<OrderAggregate>, RepositoryError> {
        let orders = self.find_by_user(user_id).await?;
        Ok(orders.into_iter().find(|o| o.state == OrderState::Cart))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
        self.select_snapshots("SELECT snapshot FROM orders WHERE user_id = ?", user_id).await
    }

    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<OrderAggregate>, RepositoryError> {
        self.select_snapshots("SELECT snapshot FROM orders WHERE store_id = ?", store_id).await
    }

    async fn find_carts(&self) -> Result<Vec<OrderAggregate>, RepositoryError> {
        let result = self
            .session
            .query_unpaged("SELECT snapshot FROM orders WHERE state = ?", (OrderState::Cart.as_str(),))
            .await
            .map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        let mut carts = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(backend)? {
            let (snapshot,) = row.map_err(backend)?;
            carts.push(decode_snapshot(&snapshot)?);
        }
        Ok(carts)
    }

    async fn save(
        &self,
        order: &OrderAggregate,
        expected_version: i64,
        events: Vec<EventEnvelope<OrderEvent>>,
    ) -> Result<(), RepositoryError> {
        if order.state == OrderState::Cart && self.other_cart_exists(order).await? {
            return Err(RepositoryError::Conflict(format!(
                "user {} already has an open cart",
                order.user_id
            )));
        }

        let snapshot = encode_snapshot(order)?;
        let journal = encode_journal(&events)?;

        let applied = if expected_version == 0 {
            self.write_if(
                INSERT_ORDER,
                (
                    order.id,
                    order.user_id,
                    order.store_id,
                    order.state.as_str(),
                    order.version,
                    snapshot,
                    journal,
                    order.updated_at,
                ),
            )
            .await?
        } else {
            self.write_if(
                UPDATE_ORDER,
                (
                    order.user_id,
                    order.store_id,
                    order.state.as_str(),
                    order.version,
                    snapshot,
                    order.updated_at,
                    journal,
                    order.id,
                    expected_version,
                ),
            )
            .await?
        };

        if !applied {
            return Err(RepositoryError::Conflict(format!(
                "order {}: stored version is no longer {}",
                order.id, expected_version
            )));
        }

        tracing::debug!(
            order_id = %order.id,
            version = order.version,
            event_count = events.len(),
            "Stored order snapshot and journal"
        );

        Ok(())
    }

    async fn load_events(&self, order_id: Uuid) -> Result<Vec<EventEnvelope<OrderEvent>>, RepositoryError> {
        let result = self
            .session
            .query_unpaged("SELECT journal FROM orders WHERE order_id = ?", (order_id,))
            .await
            .map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        match rows_result.maybe_first_row::<(Option<Vec<String>>,)>().map_err(backend)? {
            Some((Some(entries),)) => decode_journal(entries),
            _ => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// Reviews
// ============================================================================

pub struct ScyllaReviewRepository {
    session: Arc<Session>,
}

impl ScyllaReviewRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn select_reviews(&self, query: &str, key: Uuid) -> Result<Vec<Review>, RepositoryError> {
        let result = self.session.query_unpaged(query, (key,)).await.map_err(backend)?;
        let rows_result = result.into_rows_result().map_err(backend)?;

        let mut reviews = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(backend)? {
            let (payload,) = row.map_err(backend)?;
            reviews.push(serde_json::from_str(&payload)?);
        }
        Ok(reviews)
    }
}

#[async_trait]
impl ReviewRepository for ScyllaReviewRepository {
    async fn save(&self, review: &Review) -> Result<(), RepositoryError> {
        if self.exists_for_order(review.order_id).await? {
            return Err(RepositoryError::Conflict(format!("order {} already reviewed", review.order_id)));
        }

        let payload = serde_json::to_string(review)?;
        self.session
            .query_unpaged(
                "INSERT INTO reviews (review_id, order_id, user_id, store_id, payload) VALUES (?, ?, ?, ?, ?)",
                (review.id, review.order_id, review.user_id, review.store_id, payload),
            )
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn exists_for_order(&self, order_id: Uuid) -> Result<bool, RepositoryError> {
        let reviews = self
            .select_reviews("SELECT payload FROM reviews WHERE order_id = ?", order_id)
            .await?;
        Ok(!reviews.is_empty())
    }

    async fn find_by_store(&self, store_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        self.select_reviews("SELECT payload FROM reviews WHERE store_id = ?", store_id).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        self.select_reviews("SELECT payload FROM reviews WHERE user_id = ?", user_id).await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
