use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        audit::AuditLogList,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        dashboard::{Dashboard, DashboardStats, RecentOrder},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        plans::{AssignPlanRequest, PlanAssignment, PlanLimitList, PlanLimitRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        settings::UpdateSettingsRequest,
        uploads::{DeleteUploadRequest, DeletedUpload, UploadForm},
        usage::{DatabaseUsage, PlanInfo, StorageReport, UsageReport},
        users::{UpdateUserRequest, UserList},
    },
    models::{
        AppSettings, AuditLog, Category, CategorySummary, Order, OrderItem, OrderStatus,
        PlanLimit, Product, User, UserRole,
    },
    pricing::PriceInput,
    response::{ApiResponse, Meta},
    routes::{
        admin, audit, auth, categories, health, orders, params, plans, products, settings,
        uploads, usage, users,
    },
    storage::StoredObject,
    usage::{PlanQuota, UsageMetric, UsageStatus},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        admin::dashboard,
        audit::list_audit_logs,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        settings::get_settings,
        settings::update_settings,
        plans::list_plans,
        plans::get_plan,
        plans::create_plan,
        plans::update_plan,
        plans::delete_plan,
        plans::assign_plan,
        uploads::upload_image,
        uploads::delete_upload,
        usage::usage
    ),
    components(
        schemas(
            User,
            UserRole,
            Category,
            CategorySummary,
            Product,
            PriceInput,
            Order,
            OrderItem,
            OrderStatus,
            AppSettings,
            PlanLimit,
            AuditLog,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CategoryList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            UserList,
            UpdateUserRequest,
            UpdateSettingsRequest,
            PlanLimitList,
            PlanLimitRequest,
            AssignPlanRequest,
            PlanAssignment,
            Dashboard,
            DashboardStats,
            RecentOrder,
            UploadForm,
            DeleteUploadRequest,
            DeletedUpload,
            StoredObject,
            UsageReport,
            PlanInfo,
            DatabaseUsage,
            StorageReport,
            PlanQuota,
            UsageMetric,
            UsageStatus,
            AuditLogList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::UserQuery,
            params::AuditLogQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Dashboard>,
            ApiResponse<UsageReport>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Admin", description = "Dashboard and audit trail"),
        (name = "Categories", description = "Category management"),
        (name = "Products", description = "Product management"),
        (name = "Orders", description = "Order management"),
        (name = "Users", description = "User management"),
        (name = "Settings", description = "Store settings"),
        (name = "Plans", description = "Plan limits and assignments"),
        (name = "Uploads", description = "Image storage"),
        (name = "Usage", description = "Resource usage against plan limits"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_admin_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/admin/dashboard",
            "/api/admin/categories/{id}",
            "/api/admin/products",
            "/api/admin/orders/{id}/status",
            "/api/admin/plans/{id}/assign",
            "/api/admin/uploads",
            "/api/usage",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
