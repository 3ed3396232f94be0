use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{OrderAggregate, OrderMenu, OrderMenuOption, OrderState};

// ============================================================================
// Read models returned to callers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderMenuView {
    pub order_menu_id: Uuid,
    pub menu_id: Uuid,
    pub name: String,
    pub price: u64,
    pub options: Vec<OrderMenuOption>,
    pub line_total: u64,
}

impl From<&OrderMenu> for OrderMenuView {
    fn from(menu: &OrderMenu) -> Self {
        Self {
            order_menu_id: menu.id,
            menu_id: menu.menu_id,
            name: menu.name.clone(),
            price: menu.price,
            options: menu.options.clone(),
            line_total: menu.line_total(),
        }
    }
}

/// Current cart of a user. A user without a cart gets an empty view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub order_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub items: Vec<OrderMenuView>,
    pub total_price: u64,
}

impl CartView {
    pub fn empty() -> Self {
        Self { order_id: None, store_id: None, items: Vec::new(), total_price: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&OrderAggregate> for CartView {
    fn from(cart: &OrderAggregate) -> Self {
        Self {
            order_id: Some(cart.id),
            store_id: Some(cart.store_id),
            items: cart.order_menus.iter().map(OrderMenuView::from).collect(),
            total_price: cart.total_price(),
        }
    }
}

/// Placed order with itemized menus and computed total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub state: OrderState,
    pub total_price: u64,
    pub menus: Vec<OrderMenuView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OrderAggregate> for OrderView {
    fn from(order: &OrderAggregate) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            store_id: order.store_id,
            state: order.state,
            total_price: order.total_price(),
            menus: order.order_menus.iter().map(OrderMenuView::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_view_wire_shape() {
        let (mut order, _) = OrderAggregate::open_cart(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        order.state = OrderState::Pending;
        order.order_menus.push(OrderMenu {
            id: Uuid::new_v4(),
            menu_id: Uuid::new_v4(),
            name: "Naengmyeon".to_string(),
            price: 11_000,
            options: vec![OrderMenuOption { option_item_id: Uuid::new_v4(), name: "Extra noodles".to_string(), additional_price: 2_000 }],
        });

        let json = serde_json::to_value(OrderView::from(&order)).unwrap();

        assert_eq!(json["state"], "PENDING");
        assert_eq!(json["total_price"], 13_000);
        assert_eq!(json["menus"][0]["line_total"], 13_000);
        assert_eq!(json["menus"][0]["options"][0]["name"], "Extra noodles");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.total_price, 0);
        assert_eq!(serde_json::to_value(&view).unwrap()["order_id"], serde_json::Value::Null);
    }
}
