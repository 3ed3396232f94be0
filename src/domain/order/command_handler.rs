use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::{Aggregate, DomainEvent, EventEnvelope};
use crate::persistence::OrderRepository;

use super::aggregate::OrderAggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Repository
//
// The aggregate passed in is only updated once the repository accepted the
// write, so a rejected command or a failed save leaves the caller's copy as
// it was.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderCommandHandler {
    repository: Arc<dyn OrderRepository>,
}

impl OrderCommandHandler {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Handle a command against a loaded order and persist resulting events.
    ///
    /// Returns the events written; an empty list means nothing changed.
    pub async fn handle(
        &self,
        order: &mut OrderAggregate,
        command: &OrderCommand,
        actor_id: Uuid,
        correlation_id: Uuid,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let expected_version = order.version();

        let mut working = order.clone();
        let events = working.execute(command)?;
        if events.is_empty() {
            return Ok(events);
        }

        self.commit(&mut working, expected_version, events.clone(), actor_id, correlation_id)
            .await?;
        *order = working;

        Ok(events)
    }

    /// Persist events that were already applied to `order`.
    ///
    /// Used directly when a new cart is opened, where the first event comes
    /// from `OrderAggregate::open_cart` rather than a command.
    pub async fn commit(
        &self,
        order: &mut OrderAggregate,
        expected_version: i64,
        events: Vec<OrderEvent>,
        actor_id: Uuid,
        correlation_id: Uuid,
    ) -> Result<i64, OrderError> {
        let store_id = order.store_id.to_string();

        // Wrap in envelopes
        let mut envelopes = Vec::with_capacity(events.len());
        let mut seq = expected_version;

        for domain_event in events {
            seq += 1;
            let envelope = EventEnvelope::new(
                order.id,
                seq,
                domain_event.event_type().to_string(),
                domain_event.clone(),
                correlation_id,
                domain_event.occurred_at(),
            )
            .with_user(actor_id)
            .with_metadata("store_id", store_id.as_str());

            envelopes.push(envelope);
        }

        order.set_version(seq);
        if let Err(e) = self.repository.save(order, expected_version, envelopes).await {
            order.set_version(expected_version);
            return Err(e.into());
        }

        tracing::debug!(
            order_id = %order.id,
            version = seq,
            state = %order.state,
            "Order events committed"
        );

        Ok(seq)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
