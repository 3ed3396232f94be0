use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::order::OrderState;
use crate::domain::review::{RatingFilter, Review, ReviewError};
use crate::metrics::Metrics;
use crate::persistence::{OrderRepository, RepositoryError, ReviewRepository};

pub struct ReviewService {
    orders: Arc<dyn OrderRepository>,
    reviews: Arc<dyn ReviewRepository>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl ReviewService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        reviews: Arc<dyn ReviewRepository>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { orders, reviews, clock, metrics }
    }

    /// Review a completed order. Each order can be reviewed once, by the
    /// customer who placed it.
    pub async fn create_review(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        rating: u8,
        content: Option<String>,
    ) -> Result<Review, ReviewError> {
        let result = self.try_create_review(user_id, order_id, rating, content).await;
        if let Err(e) = &result {
            self.metrics.record_rejection("create_review", e.code());
            tracing::warn!(user_id = %user_id, order_id = %order_id, code = e.code(), "Review rejected: {}", e);
        }
        result
    }

    async fn try_create_review(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        rating: u8,
        content: Option<String>,
    ) -> Result<Review, ReviewError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ReviewError::OrderNotFound(order_id))?;

        if order.user_id != user_id {
            return Err(ReviewError::InvalidRole);
        }
        if order.state != OrderState::Completed {
            return Err(ReviewError::OrderNotCompleted(order.state));
        }

        let review = Review::for_order(&order, rating, content, self.clock.now())?;

        if self.reviews.exists_for_order(order_id).await? {
            return Err(ReviewError::AlreadyReviewed(order_id));
        }
        match self.reviews.save(&review).await {
            Err(RepositoryError::Conflict(_)) => return Err(ReviewError::AlreadyReviewed(order_id)),
            other => other?,
        }

        self.metrics.reviews_created.inc();
        tracing::info!(review_id = %review.id, order_id = %order_id, store_id = %review.store_id, rating, "Review created");

        Ok(review)
    }

    /// Reviews of a store within the rating bounds, newest first
    pub async fn get_reviews_by_store(&self, store_id: Uuid, filter: RatingFilter) -> Result<Vec<Review>, ReviewError> {
        let mut reviews = self.reviews.find_by_store(store_id).await?;
        reviews.retain(|r| filter.matches(r.rating));
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// The user's own reviews, newest first
    pub async fn get_my_reviews(&self, user_id: Uuid) -> Result<Vec<Review>, ReviewError> {
        let mut reviews = self.reviews.find_by_user(user_id).await?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}
