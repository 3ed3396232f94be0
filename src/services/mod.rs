// ============================================================================
// Services - the operations exposed to callers
// ============================================================================
//
// Each service resolves ids through the catalog, serializes per-user work
// with UserLocks and drives the order aggregate via its command handler.
//
// ============================================================================

mod locks;
mod views;
mod cart_manager;
mod order_service;
mod order_query;
mod review_service;

pub use locks::UserLocks;
pub use views::{CartView, OrderMenuView, OrderView};
pub use cart_manager::{CartManager, SweepReport};
pub use order_service::OrderService;
pub use order_query::OrderQuery;
pub use review_service::ReviewService;
