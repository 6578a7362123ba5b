use sea_orm::{ConnectionTrait, Statement};
use storefront_admin_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        categories::{CreateCategoryRequest, UpdateCategoryRequest},
        orders::UpdateOrderStatusRequest,
        plans::{AssignPlanRequest, PlanLimitRequest},
        products::{CreateProductRequest, UpdateProductRequest},
        settings::UpdateSettingsRequest,
        users::UpdateUserRequest,
    },
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    pricing::PriceInput,
    routes::params::{AuditLogQuery, OrderListQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{
        audit_service, auth_service, category_service, dashboard_service, media_service,
        order_service, plan_service, product_service, settings_service, usage_service,
        user_service,
    },
    state::AppState,
    storage::ObjectStore,
};
use tempfile::TempDir;
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";

// Admin flow: catalogue with images -> order totals -> settings -> dashboard -> usage.
#[tokio::test]
async fn admin_manages_catalogue_orders_and_usage() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let storage_dir = TempDir::new()?;
    let state = setup_state(&database_url, &storage_dir).await?;

    // Register and log in through the auth service, then promote to admin.
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Ops".into(),
            email: "Ops@Example.com".into(),
            password: "long-enough".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.email, "ops@example.com");
    assert_eq!(registered.role, "user");

    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(registered.id)
        .execute(&state.pool)
        .await?;

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "ops@example.com".into(),
            password: "long-enough".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let token = login.token.strip_prefix("Bearer ").unwrap();
    let admin: AuthUser = decode_token(token, JWT_SECRET)?;
    assert_eq!(admin.user_id, registered.id);
    assert_eq!(admin.role, "admin");

    // Categories: the public one is protected, names are unique ignoring case.
    let public = create_category(&state, &admin, "public").await?;
    let mugs = create_category(&state, &admin, "Mugs").await?;

    let duplicate = create_category(&state, &admin, "MUGS").await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let rename_public = category_service::update_category(
        &state,
        &admin,
        public,
        UpdateCategoryRequest {
            name: Some("everything".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(rename_public, Err(AppError::BadRequest(_))));

    let delete_public = category_service::delete_category(&state, &admin, public).await;
    assert!(matches!(delete_public, Err(AppError::BadRequest(_))));

    // Products: prices arrive as text and are stored in cents.
    let image = media_service::upload_image(
        &state,
        &admin,
        media_service::ImageUpload {
            folder: Some("products".into()),
            file_name: "mug.png".into(),
            content_type: "image/png".into(),
            data: b"not-really-a-png".to_vec(),
        },
    )
    .await?
    .data
    .unwrap();
    let image_file = storage_dir.path().join("images").join(&image.path);
    assert!(image_file.exists());

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Ceramic Mug".into(),
            description: Some("350 ml".into()),
            price: PriceInput::from("$12.50"),
            sale_price: Some(PriceInput::from("9.99")),
            category_id: Some(mugs),
            image_urls: vec![image.url.clone()],
            is_hot: true,
            is_new: false,
            on_sale: true,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(product.price, 1250);
    assert_eq!(product.sale_price, Some(999));
    assert_eq!(product.category.as_ref().map(|c| c.id), Some(mugs));

    let bad_sale = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            sale_price: Some(PriceInput::from("20")),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_sale, Err(AppError::BadRequest(_))));

    // Dropping the image URL removes the stored file.
    let updated = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            image_urls: Some(vec![]),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(updated.image_urls.is_empty());
    assert!(!image_file.exists());

    // Orders: totals use the configured delivery cost.
    settings_service::update_settings(
        &state,
        &admin,
        UpdateSettingsRequest {
            currency_code: "eur".into(),
            delivery_cost: PriceInput::from("3"),
        },
    )
    .await?;

    let order_id = insert_order(&state, product.id).await?;

    let order = order_service::get_order(&state, order_id).await?.data.unwrap();
    assert_eq!(order.item_count, 2);
    assert_eq!(order.subtotal, 2 * 1250 + 499);
    assert_eq!(order.delivery_cost, 300);
    assert_eq!(order.grand_total, 2 * 1250 + 499 + 300);

    let shipped = order_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "Shipped".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, "shipped");

    let invalid = order_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "paid".into(),
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    let shipped_orders = order_service::list_orders(
        &state,
        OrderListQuery {
            status: Some("shipped".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(shipped_orders.meta.unwrap().total, Some(1));

    // Dashboard.
    let dashboard = dashboard_service::dashboard(&state).await?.data.unwrap();
    assert_eq!(dashboard.stats.total_orders, 1);
    assert_eq!(dashboard.stats.total_sales, 2999);
    assert_eq!(dashboard.stats.total_sales_display, "€29.99");
    assert_eq!(dashboard.stats.total_products, 1);
    assert_eq!(dashboard.recent_orders[0].item_count, 2);

    // Usage: built-in limits until a default plan exists.
    let usage = usage_service::usage_report(&state, &admin).await?.data.unwrap();
    assert_eq!(usage.plan.source, "built_in");
    assert!(!usage.api_requests.measured);
    assert_eq!(usage.users.used, 1);

    plan_service::create_plan(&state, &admin, plan("Pro", 10)?).await?;
    let usage = usage_service::usage_report(&state, &admin).await?.data.unwrap();
    assert_eq!(usage.plan.source, "default_plan");
    assert_eq!(usage.plan.quota.max_users, 10);
    assert!(usage.users.percentage > 0.0);

    // An expired assignment is ignored; a live one wins over the default plan.
    let starter = plan_service::create_plan(&state, &admin, plan("Starter", 5)?)
        .await?
        .data
        .unwrap();
    sqlx::query(
        "INSERT INTO user_plans (id, user_id, plan_id, assigned_at, expires_at) VALUES ($1, $2, $3, now(), now() - interval '1 day')",
    )
    .bind(Uuid::new_v4())
    .bind(admin.user_id)
    .bind(starter.id)
    .execute(&state.pool)
    .await?;
    let usage = usage_service::usage_report(&state, &admin).await?.data.unwrap();
    assert_eq!(usage.plan.source, "default_plan");

    let past = plan_service::assign_plan(
        &state,
        &admin,
        starter.id,
        AssignPlanRequest {
            user_id: admin.user_id,
            expires_at: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
        },
    )
    .await;
    assert!(matches!(past, Err(AppError::BadRequest(_))));

    plan_service::assign_plan(
        &state,
        &admin,
        starter.id,
        AssignPlanRequest {
            user_id: admin.user_id,
            expires_at: None,
        },
    )
    .await?;
    let usage = usage_service::usage_report(&state, &admin).await?.data.unwrap();
    assert_eq!(usage.plan.source, "assigned");
    assert_eq!(usage.plan.plan_name, "Starter");
    assert_eq!(usage.plan.quota.max_users, 5);

    // Product listing: search, flags and price ordering.
    let teapot = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Glass Teapot".into(),
            description: Some("Heat-proof".into()),
            price: PriceInput::from("30"),
            sale_price: None,
            category_id: Some(mugs),
            image_urls: vec![],
            is_hot: false,
            is_new: true,
            on_sale: false,
        },
    )
    .await?
    .data
    .unwrap();

    let by_name = product_names(
        &state,
        ProductQuery {
            q: Some("teapot".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_name, vec!["Glass Teapot"]);

    let by_description = product_names(
        &state,
        ProductQuery {
            q: Some("350".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_description, vec!["Ceramic Mug"]);

    let new_only = product_names(
        &state,
        ProductQuery {
            is_new: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(new_only, vec!["Glass Teapot"]);

    let cheapest_first = product_names(
        &state,
        ProductQuery {
            category_id: Some(mugs),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(cheapest_first, vec!["Ceramic Mug", "Glass Teapot"]);

    let dearest_first = product_names(
        &state,
        ProductQuery {
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(dearest_first, vec!["Glass Teapot", "Ceramic Mug"]);

    // Deleting a product removes its images.
    let towel_image = upload(&state, &admin, "towel.png").await?;
    let towel_file = storage_dir.path().join("images").join(&towel_image.path);
    let towel = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Tea Towel".into(),
            description: None,
            price: PriceInput::from("5"),
            sale_price: None,
            category_id: None,
            image_urls: vec![towel_image.url.clone()],
            is_hot: false,
            is_new: false,
            on_sale: false,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(towel_file.exists());
    product_service::delete_product(&state, &admin, towel.id).await?;
    assert!(!towel_file.exists());

    // Replacing a category image deletes the old file.
    let first = upload(&state, &admin, "mugs-1.png").await?;
    let second = upload(&state, &admin, "mugs-2.png").await?;
    let first_file = storage_dir.path().join("images").join(&first.path);
    let second_file = storage_dir.path().join("images").join(&second.path);
    for url in [&first.url, &second.url] {
        category_service::update_category(
            &state,
            &admin,
            mugs,
            UpdateCategoryRequest {
                image_url: Some(url.clone()),
                ..Default::default()
            },
        )
        .await?;
    }
    assert!(!first_file.exists());
    assert!(second_file.exists());

    // Admins cannot lock themselves out, but can manage other accounts.
    let demote_self = user_service::update_user(
        &state,
        &admin,
        admin.user_id,
        UpdateUserRequest {
            role: Some("user".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(demote_self, Err(AppError::BadRequest(_))));

    let deactivate_self = user_service::update_user(
        &state,
        &admin,
        admin.user_id,
        UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(deactivate_self, Err(AppError::BadRequest(_))));

    let delete_self = user_service::delete_user(&state, &admin, admin.user_id).await;
    assert!(matches!(delete_self, Err(AppError::BadRequest(_))));

    let other = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Rae".into(),
            email: "rae@example.com".into(),
            password: "password-2".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let deactivated = user_service::update_user(
        &state,
        &admin,
        other.id,
        UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!deactivated.is_active);
    user_service::delete_user(&state, &admin, other.id).await?;

    // Audit trail, filtered by action.
    let deletions = audit_service::list_audit_logs(
        &state,
        AuditLogQuery {
            action: Some("product_delete".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(deletions.meta.unwrap().total, Some(1));
    let entry = &deletions.data.unwrap().items[0];
    assert_eq!(entry.action, "product_delete");
    assert_eq!(entry.user_id, Some(admin.user_id));

    let category_updates = audit_service::list_audit_logs(
        &state,
        AuditLogQuery {
            action: Some("category_update".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(category_updates.meta.unwrap().total, Some(2));

    // Deleting a category detaches its products.
    category_service::delete_category(&state, &admin, mugs).await?;
    for id in [product.id, teapot.id] {
        let detached = product_service::get_product(&state, id).await?.data.unwrap();
        assert_eq!(detached.category_id, None);
    }

    Ok(())
}

async fn setup_state(database_url: &str, storage_dir: &TempDir) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = orm_from_pool(pool.clone());
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, products, categories, user_plans, plan_limits, app_settings, audit_logs, users CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: JWT_SECRET.into(),
        storage_root: storage_dir.path().display().to_string(),
        storage_bucket: "images".into(),
        public_base_url: "http://localhost:3000".into(),
        max_upload_bytes: 1024 * 1024,
        cors_origin: None,
    };
    let storage = ObjectStore::new(
        storage_dir.path(),
        "images",
        "http://localhost:3000",
        config.max_upload_bytes,
    )
    .await?;

    Ok(AppState::new(pool, storage, config))
}

async fn create_category(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
) -> Result<Uuid, AppError> {
    let resp = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: name.to_string(),
            description: None,
            image_url: None,
        },
    )
    .await?;
    Ok(resp.data.map(|c| c.id).unwrap_or_default())
}

async fn insert_order(state: &AppState, product_id: Uuid) -> anyhow::Result<Uuid> {
    let order_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO orders (id, customer_name, payment_method, total) VALUES ($1, $2, $3, $4)",
    )
    .bind(order_id)
    .bind("Sam")
    .bind("cash")
    .bind(2999_i64)
    .execute(&state.pool)
    .await?;

    for (name, product, quantity, price) in [
        ("Ceramic Mug", Some(product_id), 2, 1250_i64),
        ("Gift Wrap", None, 1, 499_i64),
    ] {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, quantity, price) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(product)
        .bind(name)
        .bind(quantity)
        .bind(price)
        .execute(&state.pool)
        .await?;
    }

    Ok(order_id)
}

fn plan(name: &str, max_users: i64) -> anyhow::Result<PlanLimitRequest> {
    Ok(serde_json::from_value(serde_json::json!({
        "plan_name": name,
        "plan_type": "monthly",
        "max_users": max_users
    }))?)
}

async fn upload(
    state: &AppState,
    admin: &AuthUser,
    file_name: &str,
) -> anyhow::Result<storefront_admin_api::storage::StoredObject> {
    let stored = media_service::upload_image(
        state,
        admin,
        media_service::ImageUpload {
            folder: None,
            file_name: file_name.into(),
            content_type: "image/png".into(),
            data: b"png-bytes".to_vec(),
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("upload returned no data"))?;
    Ok(stored)
}

async fn product_names(state: &AppState, query: ProductQuery) -> anyhow::Result<Vec<String>> {
    let list = product_service::list_products(state, query)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("listing returned no data"))?;
    Ok(list.items.into_iter().map(|p| p.name).collect())
}
