// ============================================================================
// Test Fixture - a seeded catalog wired to in-memory services
// ============================================================================

use chrono::{Duration, NaiveTime, Offset, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::ManualClock;
use crate::domain::catalog::{
    BusinessHours, InMemoryCatalog, Menu, OptionCategory, OptionItem, Store, StoreStatus, User, UserRole,
};
use crate::domain::order::{OptionSelection, OrderState};
use crate::metrics::Metrics;
use crate::persistence::{InMemoryOrderRepository, InMemoryReviewRepository};
use crate::services::{CartManager, OrderQuery, OrderService, OrderView, ReviewService, UserLocks};

pub struct Fixture {
    pub catalog: InMemoryCatalog,
    pub orders: Arc<InMemoryOrderRepository>,
    pub metrics: Arc<Metrics>,
    pub clock: Arc<ManualClock>,

    pub carts: Arc<CartManager>,
    pub order_service: Arc<OrderService>,
    pub queries: OrderQuery,
    pub reviews: ReviewService,

    pub customer: User,
    pub other_customer: User,
    pub owner: User,
    pub other_owner: User,

    /// 09:00 - 22:00, minimum 15,000
    pub chinese: Store,
    pub korean: Store,
    /// 17:00 - 02:00
    pub chicken_store: Store,

    pub jjajang: Menu,
    pub jjajang_size: OptionCategory,
    pub jjambbong: Menu,
    pub jjambbong_toppings: OptionCategory,
    pub tangsuyuk: Menu,
    pub danmuji: Menu,
    pub bibimbap: Menu,
    pub chicken: Menu,
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn store(owner: &User, name: &str, hours: BusinessHours, minimum_order_price: u64) -> Store {
    Store {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        name: name.to_string(),
        hours,
        minimum_order_price,
        status: StoreStatus::Open,
        deleted: false,
    }
}

fn menu(store: &Store, name: &str, price: u64) -> Menu {
    Menu {
        id: Uuid::new_v4(),
        store_id: store.id,
        name: name.to_string(),
        price,
        deleted: false,
    }
}

fn item(name: &str, additional_price: u64) -> OptionItem {
    OptionItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        additional_price,
    }
}

impl Fixture {
    /// Clock starts at 2024-05-01 12:00 with business time equal to UTC
    pub async fn new() -> Self {
        let catalog = InMemoryCatalog::new();

        let customer = User::new("Jisoo", "jisoo@example.com", UserRole::Customer);
        let other_customer = User::new("Hyun", "hyun@example.com", UserRole::Customer);
        let owner = User::new("Mr. Wang", "wang@example.com", UserRole::Owner);
        let other_owner = User::new("Mrs. Kim", "kim@example.com", UserRole::Owner);
        for user in [&customer, &other_customer, &owner, &other_owner] {
            catalog.insert_user(user.clone()).await;
        }

        let chinese = store(&owner, "Golden Dragon", BusinessHours::new(at(9, 0), at(22, 0)), 15_000);
        let korean = store(&other_owner, "Jeonju House", BusinessHours::new(at(10, 0), at(21, 0)), 10_000);
        let chicken_store = store(&other_owner, "Midnight Chicken", BusinessHours::new(at(17, 0), at(2, 0)), 16_000);
        for s in [&chinese, &korean, &chicken_store] {
            catalog.insert_store(s.clone()).await;
        }

        let jjajang = menu(&chinese, "Jjajangmyeon", 8_000);
        let jjambbong = menu(&chinese, "Jjambbong", 9_000);
        let tangsuyuk = menu(&chinese, "Tangsuyuk", 18_000);
        let danmuji = menu(&chinese, "Danmuji", 5_000);
        let bibimbap = menu(&korean, "Bibimbap", 11_000);
        let chicken = menu(&chicken_store, "Fried Chicken", 20_000);
        for m in [&jjajang, &jjambbong, &tangsuyuk, &danmuji, &bibimbap, &chicken] {
            catalog.insert_menu(m.clone()).await;
        }

        let jjajang_size = OptionCategory {
            id: Uuid::new_v4(),
            menu_id: jjajang.id,
            name: "Size".to_string(),
            required: true,
            multiple: false,
            max_options: None,
            items: vec![item("Regular", 0), item("Large", 1_000)],
        };
        let jjambbong_toppings = OptionCategory {
            id: Uuid::new_v4(),
            menu_id: jjambbong.id,
            name: "Toppings".to_string(),
            required: false,
            multiple: true,
            max_options: Some(3),
            items: vec![item("Extra seafood", 500), item("Extra noodles", 300)],
        };
        catalog.insert_option_category(jjajang_size.clone()).await;
        catalog.insert_option_category(jjambbong_toppings.clone()).await;

        let orders = Arc::new(InMemoryOrderRepository::new());
        let review_store = Arc::new(InMemoryReviewRepository::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let locks = UserLocks::new();
        let lookup = Arc::new(catalog.clone());

        let carts = Arc::new(CartManager::new(
            lookup.clone(),
            orders.clone(),
            locks.clone(),
            clock.clone(),
            metrics.clone(),
            Duration::hours(24),
        ));
        let order_service = Arc::new(OrderService::new(
            lookup.clone(),
            orders.clone(),
            locks,
            clock.clone(),
            metrics.clone(),
            Utc.fix(),
        ));
        let queries = OrderQuery::new(lookup, orders.clone());
        let reviews = ReviewService::new(orders.clone(), review_store, clock.clone(), metrics.clone());

        Self {
            catalog,
            orders,
            metrics,
            clock,
            carts,
            order_service,
            queries,
            reviews,
            customer,
            other_customer,
            owner,
            other_owner,
            chinese,
            korean,
            chicken_store,
            jjajang,
            jjajang_size,
            jjambbong,
            jjambbong_toppings,
            tangsuyuk,
            danmuji,
            bibimbap,
            chicken,
        }
    }

    /// Large size
    pub fn jjajang_selection(&self) -> Vec<OptionSelection> {
        vec![OptionSelection::new(self.jjajang_size.id, vec![self.jjajang_size.items[1].id])]
    }

    /// Both toppings
    pub fn jjambbong_selection(&self) -> Vec<OptionSelection> {
        let ids = self.jjambbong_toppings.items.iter().map(|i| i.id).collect();
        vec![OptionSelection::new(self.jjambbong_toppings.id, ids)]
    }

    /// A pending 18,000 order at the Chinese store
    pub async fn placed_order(&self) -> OrderView {
        self.carts.add_to_cart(self.customer.id, self.tangsuyuk.id, vec![]).await.unwrap();
        self.order_service.create_order(self.customer.id).await.unwrap()
    }

    pub async fn completed_order(&self) -> OrderView {
        let mut view = self.placed_order().await;
        for target in [OrderState::Accepted, OrderState::Delivery, OrderState::Completed] {
            view = self
                .order_service
                .update_order_state(self.owner.id, view.order_id, target)
                .await
                .unwrap();
        }
        view
    }
}
