use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Minor units.
    pub total_sales: i64,
    pub total_sales_display: String,
    pub currency_code: String,
    pub total_orders: i64,
    pub total_products: i64,
    pub total_users: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentOrder {
    pub order: Order,
    pub item_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_users: Vec<User>,
}
