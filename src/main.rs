use actix::prelude::*;
use anyhow::Context;
use chrono::NaiveTime;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod actors;
mod clock;
mod config;
mod domain;
mod event_sourcing;
mod metrics;
mod persistence;
mod services;

#[cfg(test)]
mod test_support;

use actors::{CartSweeper, SweepSchedule};
use clock::{Clock, SystemClock};
use config::AppConfig;
use domain::catalog::{
    BusinessHours, InMemoryCatalog, Menu, OptionCategory, OptionItem, Store, StoreStatus, User, UserRole,
};
use domain::order::{OptionSelection, OrderState};
use domain::review::RatingFilter;
use persistence::{
    InMemoryOrderRepository, InMemoryReviewRepository, OrderRepository, ReviewRepository, ScyllaOrderRepository,
    ScyllaReviewRepository,
};
use services::{CartManager, OrderQuery, OrderService, ReviewService, UserLocks};

/// Ids of the seeded demo catalog
struct DemoCatalog {
    customer_id: Uuid,
    owner_id: Uuid,
    store_id: Uuid,
    noodles_id: Uuid,
    dumplings_id: Uuid,
    size_category: OptionCategory,
}

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,delivery_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting delivery order engine");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        metrics_port = config.metrics_port,
        cart_ttl_hours = config.cart_ttl.num_hours(),
        sweep_at = %config.cart_sweep_at,
        utc_offset = %config.business_utc_offset,
        "Configuration loaded"
    );

    // === 1. Storage ===
    let (orders, reviews): (Arc<dyn OrderRepository>, Arc<dyn ReviewRepository>) = match &config.scylla_node {
        Some(node) => {
            tracing::info!(node = %node, keyspace = %config.scylla_keyspace, "Connecting to ScyllaDB...");
            let session = persistence::connect(node, &config.scylla_keyspace)
                .await
                .context("Failed to connect to ScyllaDB")?;
            (
                Arc::new(ScyllaOrderRepository::new(session.clone())),
                Arc::new(ScyllaReviewRepository::new(session)),
            )
        }
        None => {
            tracing::warn!("SCYLLA_NODE not set, keeping orders in memory");
            (Arc::new(InMemoryOrderRepository::new()), Arc::new(InMemoryReviewRepository::new()))
        }
    };

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Services ===
    let catalog = InMemoryCatalog::new();
    let demo = seed_demo_catalog(&catalog).await;
    let lookup = Arc::new(catalog);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let locks = UserLocks::new();

    let carts = Arc::new(CartManager::new(
        lookup.clone(),
        orders.clone(),
        locks.clone(),
        clock.clone(),
        metrics.clone(),
        config.cart_ttl,
    ));
    let order_service = OrderService::new(
        lookup.clone(),
        orders.clone(),
        locks,
        clock.clone(),
        metrics.clone(),
        config.business_utc_offset,
    );
    let queries = OrderQuery::new(lookup, orders.clone());
    let review_service = ReviewService::new(orders, reviews, clock.clone(), metrics.clone());

    // === 4. Start the daily cart sweep ===
    let schedule = SweepSchedule::new(config.cart_sweep_at, config.business_utc_offset);
    let _sweeper = CartSweeper::new(carts.clone(), clock, schedule).start();

    // === 5. Demonstrate the order lifecycle ===
    run_demo(&demo, &carts, &order_service, &queries, &review_service).await?;

    tracing::info!("🎉 Demo complete, press Ctrl-C to exit");
    tokio::signal::ctrl_c().await?;
    tracing::info!("👋 Shutting down");

    Ok(())
}

async fn seed_demo_catalog(catalog: &InMemoryCatalog) -> DemoCatalog {
    let customer = User::new("Demo Customer", "customer@example.com", UserRole::Customer);
    let owner = User::new("Demo Owner", "owner@example.com", UserRole::Owner);

    let store = Store {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        name: "Noodle Bar".to_string(),
        // Open around the clock so the demo works at any hour
        hours: BusinessHours::new(NaiveTime::MIN, NaiveTime::MIN),
        minimum_order_price: 12_000,
        status: StoreStatus::Open,
        deleted: false,
    };

    let noodles = Menu {
        id: Uuid::new_v4(),
        store_id: store.id,
        name: "Jjajangmyeon".to_string(),
        price: 8_000,
        deleted: false,
    };
    let dumplings = Menu {
        id: Uuid::new_v4(),
        store_id: store.id,
        name: "Fried Dumplings".to_string(),
        price: 6_000,
        deleted: false,
    };
    let size_category = OptionCategory {
        id: Uuid::new_v4(),
        menu_id: noodles.id,
        name: "Size".to_string(),
        required: true,
        multiple: false,
        max_options: None,
        items: vec![
            OptionItem { id: Uuid::new_v4(), name: "Regular".to_string(), additional_price: 0 },
            OptionItem { id: Uuid::new_v4(), name: "Large".to_string(), additional_price: 1_000 },
        ],
    };

    let demo = DemoCatalog {
        customer_id: customer.id,
        owner_id: owner.id,
        store_id: store.id,
        noodles_id: noodles.id,
        dumplings_id: dumplings.id,
        size_category: size_category.clone(),
    };

    catalog.insert_user(customer).await;
    catalog.insert_user(owner).await;
    catalog.insert_store(store).await;
    catalog.insert_menu(noodles).await;
    catalog.insert_menu(dumplings).await;
    catalog.insert_option_category(size_category).await;

    demo
}

async fn run_demo(
    demo: &DemoCatalog,
    carts: &CartManager,
    order_service: &OrderService,
    queries: &OrderQuery,
    review_service: &ReviewService,
) -> anyhow::Result<()> {
    tracing::info!("📝 Demonstrating cart and order lifecycle");

    let large = demo
        .size_category
        .items
        .iter()
        .find(|item| item.name == "Large")
        .map(|item| item.id)
        .context("Demo size option missing")?;

    carts
        .add_to_cart(
            demo.customer_id,
            demo.noodles_id,
            vec![OptionSelection::new(demo.size_category.id, vec![large])],
        )
        .await?;
    let cart = carts.add_to_cart(demo.customer_id, demo.dumplings_id, vec![]).await?;
    tracing::info!(items = cart.items.len(), total = cart.total_price, "🛒 Cart filled");

    let order = order_service.create_order(demo.customer_id).await?;
    tracing::info!(order_id = %order.order_id, total = order.total_price, "✅ Order placed");

    for target in [OrderState::Accepted, OrderState::Delivery, OrderState::Completed] {
        let view = order_service.update_order_state(demo.owner_id, order.order_id, target).await?;
        tracing::info!(order_id = %view.order_id, state = %view.state, "➡️ Order moved");
    }

    let history = queries.get_order_history(demo.customer_id, order.order_id).await?;
    tracing::info!(order_id = %order.order_id, events = history.len(), "📜 Order journal loaded");

    let review = review_service
        .create_review(demo.customer_id, order.order_id, 5, Some("Arrived hot".to_string()))
        .await?;
    tracing::info!(review_id = %review.id, rating = review.rating, "⭐ Review written");

    let store_reviews = review_service.get_reviews_by_store(demo.store_id, RatingFilter::default()).await?;
    let store_orders = queries.get_orders_by_store(demo.owner_id, demo.store_id).await?;
    tracing::info!(
        store_id = %demo.store_id,
        orders = store_orders.len(),
        reviews = store_reviews.len(),
        "🏪 Store summary"
    );

    Ok(())
}
