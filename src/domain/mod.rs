// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// This module contains domain-specific aggregates and business logic:
// - catalog: read-only users, stores, menus and option categories
// - order: the cart/order aggregate, its events and lifecycle rules
// - review: reviews of completed orders
//
// This layer knows nothing about ScyllaDB, actors or HTTP.
//
// ============================================================================

pub mod error_kind;
pub mod catalog;
pub mod order;
pub mod review;

pub use error_kind::ErrorKind;
