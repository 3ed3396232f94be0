use uuid::Uuid;

use crate::domain::ErrorKind;
use crate::persistence::RepositoryError;
use super::value_objects::OrderState;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    // ---- not found ---------------------------------------------------------
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Store not found: {0}")]
    StoreNotFound(Uuid),

    #[error("Menu not found: {0}")]
    MenuNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("No cart for user: {0}")]
    CartNotFound(Uuid),

    #[error("Cart item not found: {0}")]
    CartItemNotFound(Uuid),

    // ---- option selection --------------------------------------------------
    #[error("Option category selected more than once: {0}")]
    DuplicateOptionCategory(Uuid),

    #[error("Menu defines {expected} option categories but {actual} were selected")]
    InvalidOptionCategoryCount { expected: usize, actual: usize },

    #[error("Option category missing from selection: {0}")]
    MissingOptionCategory(Uuid),

    #[error("Required option category has no selection: {0}")]
    RequiredOptionNotSelected(Uuid),

    #[error("Option category does not allow multiple selections: {0}")]
    MultipleSelectionNotAllowed(Uuid),

    #[error("Option category {category} allows at most {max} items, {selected} selected")]
    ExceedsMaxOptionSelection { category: Uuid, max: u32, selected: usize },

    #[error("Option item {item} does not belong to category {category}")]
    InvalidOptionItem { category: Uuid, item: Uuid },

    #[error("Option item {item} selected more than once in category {category}")]
    DuplicateOptionItem { category: Uuid, item: Uuid },

    // ---- placement ---------------------------------------------------------
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order total {total} is below the store minimum {minimum}")]
    OrderTooCheap { total: u64, minimum: u64 },

    #[error("Store is permanently closed: {0}")]
    StoreAlreadyClosed(Uuid),

    #[error("Store is not taking orders at this time")]
    OrderClosed,

    // ---- authorization -----------------------------------------------------
    #[error("Only customers can use the cart and place orders")]
    UserOnlyAccess,

    #[error("User is not allowed to perform this action")]
    InvalidRole,

    #[error("User does not own store: {0}")]
    NotStoreOwner(Uuid),

    // ---- lifecycle ---------------------------------------------------------
    #[error("Order cannot be canceled in state {0}")]
    CannotCancel(OrderState),

    #[error("Order cannot be accepted in state {0}")]
    CannotAccept(OrderState),

    #[error("Order cannot be rejected in state {0}")]
    CannotReject(OrderState),

    #[error("Delivery cannot start in state {0}")]
    CannotStartDelivery(OrderState),

    #[error("Order cannot be completed in state {0}")]
    CannotComplete(OrderState),

    #[error("Unsupported target state: {0}")]
    UnsupportedTransition(OrderState),

    #[error("Order is no longer a cart (state {0})")]
    NotACart(OrderState),

    #[error("Aggregate not initialized")]
    NotInitialized,

    // ---- persistence -------------------------------------------------------
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        use OrderError::*;
        match self {
            UserNotFound(_) | StoreNotFound(_) | MenuNotFound(_) | OrderNotFound(_)
            | CartNotFound(_) | CartItemNotFound(_) => ErrorKind::NotFound,

            DuplicateOptionCategory(_) | InvalidOptionCategoryCount { .. }
            | MissingOptionCategory(_) | RequiredOptionNotSelected(_)
            | MultipleSelectionNotAllowed(_) | ExceedsMaxOptionSelection { .. }
            | InvalidOptionItem { .. } | DuplicateOptionItem { .. }
            | EmptyCart | OrderTooCheap { .. } => ErrorKind::Validation,

            UserOnlyAccess | InvalidRole | NotStoreOwner(_) => ErrorKind::InvalidRole,

            StoreAlreadyClosed(_) | OrderClosed | CannotCancel(_) | CannotAccept(_)
            | CannotReject(_) | CannotStartDelivery(_) | CannotComplete(_)
            | UnsupportedTransition(_) | NotACart(_) | NotInitialized => ErrorKind::InvalidState,

            Storage(_) => ErrorKind::Conflict,
        }
    }

    /// Stable machine-readable code, one per variant
    pub fn code(&self) -> &'static str {
        use OrderError::*;
        match self {
            UserNotFound(_) => "USER_NOT_FOUND",
            StoreNotFound(_) => "STORE_NOT_FOUND",
            MenuNotFound(_) => "MENU_NOT_FOUND",
            OrderNotFound(_) => "ORDER_NOT_FOUND",
            CartNotFound(_) => "CART_NOT_FOUND",
            CartItemNotFound(_) => "CART_ITEM_NOT_FOUND",
            DuplicateOptionCategory(_) => "OPTION_CATEGORY_DUPLICATE",
            InvalidOptionCategoryCount { .. } => "INVALID_OPTION_CATEGORY_COUNT",
            MissingOptionCategory(_) => "MISSING_OPTION_CATEGORY",
            RequiredOptionNotSelected(_) => "REQUIRED_OPTION_NOT_SELECTED",
            MultipleSelectionNotAllowed(_) => "INVALID_MULTIPLE_SELECTION",
            ExceedsMaxOptionSelection { .. } => "EXCEEDS_MAX_OPTION_SELECTION",
            InvalidOptionItem { .. } => "INVALID_OPTION_ITEM",
            DuplicateOptionItem { .. } => "OPTION_ITEM_DUPLICATE",
            EmptyCart => "CART_EMPTY",
            OrderTooCheap { .. } => "ORDER_TOO_CHEAP",
            StoreAlreadyClosed(_) => "STORE_ALREADY_CLOSED",
            OrderClosed => "ORDER_CLOSED",
            UserOnlyAccess => "USER_ONLY_ACCESS",
            InvalidRole => "INVALID_USER_ROLE",
            NotStoreOwner(_) => "NOT_STORE_OWNER",
            CannotCancel(_) => "ORDER_CANNOT_BE_CANCELED",
            CannotAccept(_) => "ORDER_CANNOT_BE_ACCEPTED",
            CannotReject(_) => "ORDER_CANNOT_BE_REJECTED",
            CannotStartDelivery(_) => "ORDER_CANNOT_BE_DELIVERY",
            CannotComplete(_) => "ORDER_CANNOT_BE_COMPLETED",
            UnsupportedTransition(_) => "UNSUPPORTED_ORDER_STATE",
            NotACart(_) => "ORDER_NOT_CART",
            NotInitialized => "ORDER_NOT_INITIALIZED",
            Storage(RepositoryError::Conflict(_)) => "ORDER_WRITE_CONFLICT",
            Storage(_) => "ORDER_STORAGE_FAILURE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(OrderError::CartNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
        assert_eq!(OrderError::OrderTooCheap { total: 5_000, minimum: 15_000 }.kind(), ErrorKind::Validation);
        assert_eq!(OrderError::NotStoreOwner(Uuid::nil()).kind(), ErrorKind::InvalidRole);
        assert_eq!(OrderError::CannotCancel(OrderState::Accepted).kind(), ErrorKind::InvalidState);
        assert_eq!(OrderError::OrderClosed.kind(), ErrorKind::InvalidState);
        assert_eq!(
            OrderError::Storage(RepositoryError::Conflict("stale".to_string())).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_codes_distinguish_cart_hours_and_role() {
        let codes = [
            OrderError::CartNotFound(Uuid::nil()).code(),
            OrderError::OrderClosed.code(),
            OrderError::InvalidRole.code(),
        ];
        assert_eq!(codes, ["CART_NOT_FOUND", "ORDER_CLOSED", "INVALID_USER_ROLE"]);
    }
}
