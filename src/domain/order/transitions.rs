use super::errors::OrderError;
use super::value_objects::OrderState;

// ============================================================================
// Order Lifecycle Transition Table
// ============================================================================
//
// Placement (CART -> PENDING) is driven by PlaceOrder and is not listed here.
// Every other transition is a row: target state, who may request it, and the
// only state it may start from.
//
// ============================================================================

/// Party allowed to request a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The user who placed the order
    Customer,
    /// The owner of the order's store
    StoreOwner,
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    pub target: OrderState,
    pub allowed: Party,
    pub from: OrderState,
    /// Error raised when the order is not in `from`
    pub reject: fn(OrderState) -> OrderError,
}

pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        target: OrderState::Canceled,
        allowed: Party::Customer,
        from: OrderState::Pending,
        reject: OrderError::CannotCancel,
    },
    TransitionRule {
        target: OrderState::Accepted,
        allowed: Party::StoreOwner,
        from: OrderState::Pending,
        reject: OrderError::CannotAccept,
    },
    TransitionRule {
        target: OrderState::Rejected,
        allowed: Party::StoreOwner,
        from: OrderState::Pending,
        reject: OrderError::CannotReject,
    },
    TransitionRule {
        target: OrderState::Delivery,
        allowed: Party::StoreOwner,
        from: OrderState::Accepted,
        reject: OrderError::CannotStartDelivery,
    },
    TransitionRule {
        target: OrderState::Completed,
        allowed: Party::StoreOwner,
        from: OrderState::Delivery,
        reject: OrderError::CannotComplete,
    },
];

pub fn rule_for(target: OrderState) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|rule| rule.target == target)
}
