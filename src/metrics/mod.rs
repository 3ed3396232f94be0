// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Cart activity (items added/removed, store-switch resets)
// - Daily cart sweep (expired carts, failures, duration)
// - Order placement and lifecycle transitions
// - Rejected requests by operation and error code
// - Reviews written
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Cart Metrics
    pub cart_items_added: IntCounter,
    pub cart_items_removed: IntCounter,
    pub carts_reset: IntCounter,

    // Sweep Metrics
    pub carts_expired: IntCounter,
    pub sweep_failures: IntCounter,
    pub sweep_duration: Histogram,

    // Order Metrics
    pub orders_placed: IntCounter,
    pub order_transitions: IntCounterVec,

    // Request Metrics
    pub requests_rejected: IntCounterVec,

    // Review Metrics
    pub reviews_created: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Cart Metrics
        let cart_items_added = IntCounter::new("cart_items_added_total", "Menus added to carts")?;
        registry.register(Box::new(cart_items_added.clone()))?;

        let cart_items_removed = IntCounter::new("cart_items_removed_total", "Menus removed from carts")?;
        registry.register(Box::new(cart_items_removed.clone()))?;

        let carts_reset = IntCounter::new(
            "carts_reset_total",
            "Carts emptied because a menu from another store was added",
        )?;
        registry.register(Box::new(carts_reset.clone()))?;

        // Sweep Metrics
        let carts_expired = IntCounter::new("carts_expired_total", "Stale carts emptied by the daily sweep")?;
        registry.register(Box::new(carts_expired.clone()))?;

        let sweep_failures = IntCounter::new(
            "cart_sweep_failures_total",
            "Carts the daily sweep failed to expire",
        )?;
        registry.register(Box::new(sweep_failures.clone()))?;

        let sweep_duration = Histogram::with_opts(
            HistogramOpts::new("cart_sweep_duration_seconds", "Duration of one cart sweep")
                .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(sweep_duration.clone()))?;

        // Order Metrics
        let orders_placed = IntCounter::new("orders_placed_total", "Carts turned into pending orders")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order lifecycle transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        // Request Metrics
        let requests_rejected = IntCounterVec::new(
            Opts::new("requests_rejected_total", "Requests refused by a business rule"),
            &["operation", "code"],
        )?;
        registry.register(Box::new(requests_rejected.clone()))?;

        // Review Metrics
        let reviews_created = IntCounter::new("reviews_created_total", "Reviews written")?;
        registry.register(Box::new(reviews_created.clone()))?;

        Ok(Self {
            registry,
            cart_items_added,
            cart_items_removed,
            carts_reset,
            carts_expired,
            sweep_failures,
            sweep_duration,
            orders_placed,
            order_transitions,
            requests_rejected,
            reviews_created,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a lifecycle transition
    pub fn record_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    /// Helper to record a request refused with `code`
    pub fn record_rejection(&self, operation: &str, code: &str) {
        self.requests_rejected.with_label_values(&[operation, code]).inc();
    }
}
