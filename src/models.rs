use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    app_settings, audit_logs, categories, order_items, orders, plan_limits, products, users,
};

/// Name of the category that can be neither renamed nor deleted.
pub const PUBLIC_CATEGORY: &str = "public";

pub fn is_public_category(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(PUBLIC_CATEGORY)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_protected: bool,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            is_protected: is_public_category(&model.name),
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Minor units.
    pub price: i64,
    pub sale_price: Option<i64>,
    pub category_id: Option<Uuid>,
    pub category: Option<CategorySummary>,
    pub image_urls: Vec<String>,
    pub is_hot: bool,
    pub is_new: bool,
    pub on_sale: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_parts(model: products::Model, category: Option<categories::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            sale_price: model.sale_price,
            category_id: model.category_id,
            category: category.map(|c| CategorySummary {
                id: c.id,
                name: c.name,
            }),
            image_urls: model.image_urls,
            is_hot: model.is_hot,
            is_new: model.is_new,
            on_sale: model.on_sale,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("invalid order status '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            customer_name: model.customer_name,
            phone: model.phone,
            address: model.address,
            payment_method: model.payment_method,
            status: model.status,
            total: model.total,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub line_total: i64,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            line_total: crate::dto::orders::line_total(model.quantity, model.price),
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            image_url: model.image_url,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(format!("invalid role '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            photo_url: model.photo_url,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppSettings {
    pub currency_code: String,
    /// Minor units.
    pub delivery_cost: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            currency_code: DEFAULT_CURRENCY.to_string(),
            delivery_cost: 0,
            updated_at: None,
        }
    }
}

impl From<app_settings::Model> for AppSettings {
    fn from(model: app_settings::Model) -> Self {
        Self {
            currency_code: model.currency_code,
            delivery_cost: model.delivery_cost,
            updated_at: Some(model.updated_at.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanLimit {
    pub id: Uuid,
    pub plan_name: String,
    pub plan_type: String,
    pub database_size_mb: i64,
    pub max_users: i64,
    pub storage_mb: i64,
    pub api_requests: i64,
    pub realtime_connections: i64,
    pub realtime_messages: i64,
    pub edge_functions_invocations: i64,
    pub edge_functions_execution_time_hours: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<plan_limits::Model> for PlanLimit {
    fn from(model: plan_limits::Model) -> Self {
        Self {
            id: model.id,
            plan_name: model.plan_name,
            plan_type: model.plan_type,
            database_size_mb: model.database_size_mb,
            max_users: model.max_users,
            storage_mb: model.storage_mb,
            api_requests: model.api_requests,
            realtime_connections: model.realtime_connections,
            realtime_messages: model.realtime_messages,
            edge_functions_invocations: model.edge_functions_invocations,
            edge_functions_execution_time_hours: model.edge_functions_execution_time_hours,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_logs::Model> for AuditLog {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource: model.resource,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
