use std::collections::HashMap;

use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    dto::dashboard::{Dashboard, DashboardStats, RecentOrder},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        users::{Column as UserCol, Entity as Users},
    },
    error::AppResult,
    models::{Order, User},
    pricing::format_price,
    response::{ApiResponse, Meta},
    services::settings_service::current_settings,
    state::AppState,
};

const RECENT_LIMIT: u64 = 5;

pub async fn dashboard(state: &AppState) -> AppResult<ApiResponse<Dashboard>> {
    let (total_sales, total_orders): (i64, i64) =
        sqlx::query_as("SELECT COALESCE(SUM(total), 0)::BIGINT, COUNT(*) FROM orders")
            .fetch_one(&state.pool)
            .await?;
    let total_products = Products::find().count(&state.orm).await? as i64;
    let total_users = Users::find().count(&state.orm).await? as i64;
    let settings = current_settings(state).await?;

    let orders: Vec<Order> = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    let counts = item_counts(state, orders.iter().map(|o| o.id).collect()).await?;
    let recent_orders = orders
        .into_iter()
        .map(|order| RecentOrder {
            item_count: counts.get(&order.id).copied().unwrap_or(0),
            order,
        })
        .collect();

    let recent_users = Users::find()
        .order_by_desc(UserCol::CreatedAt)
        .limit(RECENT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let stats = DashboardStats {
        total_sales,
        total_sales_display: format_price(total_sales, &settings.currency_code),
        currency_code: settings.currency_code,
        total_orders,
        total_products,
        total_users,
    };

    Ok(ApiResponse::success(
        "Dashboard",
        Dashboard {
            stats,
            recent_orders,
            recent_users,
        },
        Some(Meta::empty()),
    ))
}

async fn item_counts(state: &AppState, order_ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, i64>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT order_id, COUNT(*) FROM order_items WHERE order_id = ANY($1) GROUP BY order_id",
    )
    .bind(&order_ids)
    .fetch_all(&state.pool)
    .await?;
    Ok(rows.into_iter().collect())
}
