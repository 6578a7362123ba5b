use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{non_empty, settings_service::current_settings},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().and_then(non_empty) {
        let status = parse_status(&status)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders: Vec<Order> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = load_items(state, ids).await?;
    let delivery_cost = current_settings(state).await?.delivery_cost;

    let items = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems::new(order, items, delivery_cost)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Order::from)
        .ok_or(AppError::NotFound)?;

    let items = load_items(state, vec![order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();
    let delivery_cost = current_settings(state).await?.delivery_cost;

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems::new(order, items, delivery_cost),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = parse_status(&payload.status)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status.clone();

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id = %order.id, from = %previous, to = %status, "order status changed");

    audit::record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // order_items rows go with the order (ON DELETE CASCADE).
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::deleted("Order", id))
}

async fn load_items(state: &AppState, order_ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, Vec<OrderItem>>> {
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?;

    for row in rows {
        grouped
            .entry(row.order_id)
            .or_default()
            .push(OrderItem::from(row));
    }
    Ok(grouped)
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_a_bad_request() {
        assert!(matches!(parse_status("paid"), Err(AppError::BadRequest(_))));
        assert_eq!(parse_status("PROCESSING").unwrap(), OrderStatus::Processing);
    }
}
