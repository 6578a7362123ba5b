use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub item_count: usize,
    pub subtotal: i64,
    pub delivery_cost: i64,
    pub grand_total: i64,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>, delivery_cost: i64) -> Self {
        let subtotal = order_subtotal(&items);
        Self {
            order,
            item_count: items.len(),
            items,
            subtotal,
            delivery_cost,
            grand_total: subtotal.saturating_add(delivery_cost),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

/// Sum of quantity × unit price over the order's lines, saturating at
/// `i64::MAX`.
pub fn order_subtotal(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .map(|item| line_total(item.quantity, item.price))
        .fold(0_i64, i64::saturating_add)
}

pub fn line_total(quantity: i32, price: i64) -> i64 {
    i64::from(quantity).saturating_mul(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(quantity: i32, price: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: None,
            name: "Mug".into(),
            image_url: None,
            quantity,
            price,
            line_total: line_total(quantity, price),
        }
    }

    fn order() -> Order {
        Order {
            id: Uuid::nil(),
            customer_name: "Sam".into(),
            phone: None,
            address: None,
            payment_method: Some("cash".into()),
            status: "pending".into(),
            total: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totals_add_delivery_to_subtotal() {
        let view = OrderWithItems::new(order(), vec![item(2, 1250), item(1, 499)], 300);
        assert_eq!(view.subtotal, 2999);
        assert_eq!(view.grand_total, 3299);
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let view = OrderWithItems::new(order(), vec![item(1, 100)], i64::MAX);
        assert_eq!(view.subtotal, 100);
        assert_eq!(view.grand_total, i64::MAX);

        assert_eq!(line_total(i32::MAX, i64::MAX / 2), i64::MAX);
        assert_eq!(order_subtotal(&[item(1, i64::MAX), item(1, 1)]), i64::MAX);
    }

    #[test]
    fn empty_order_has_zero_subtotal() {
        assert_eq!(order_subtotal(&[]), 0);
    }
}
