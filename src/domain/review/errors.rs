use uuid::Uuid;

use crate::domain::ErrorKind;
use crate::domain::order::OrderState;
use crate::persistence::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Only the ordering customer can review this order")]
    InvalidRole,

    #[error("Only completed orders can be reviewed (state {0})")]
    OrderNotCompleted(OrderState),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Order already reviewed: {0}")]
    AlreadyReviewed(Uuid),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::OrderNotFound(_) => ErrorKind::NotFound,
            ReviewError::InvalidRole => ErrorKind::InvalidRole,
            ReviewError::OrderNotCompleted(_) => ErrorKind::InvalidState,
            ReviewError::InvalidRating(_) => ErrorKind::Validation,
            ReviewError::AlreadyReviewed(_) | ReviewError::Storage(_) => ErrorKind::Conflict,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ReviewError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            ReviewError::InvalidRole => "INVALID_USER_ROLE",
            ReviewError::OrderNotCompleted(_) => "ORDER_NOT_COMPLETED",
            ReviewError::InvalidRating(_) => "INVALID_RATING",
            ReviewError::AlreadyReviewed(_) => "REVIEW_ALREADY_EXISTS",
            ReviewError::Storage(_) => "REVIEW_STORAGE_FAILURE",
        }
    }
}
