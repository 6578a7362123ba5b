use storefront_admin_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    models::{DEFAULT_CURRENCY, PUBLIC_CATEGORY},
    pricing::parse_price,
    services::{auth_service::hash_password, plan_service::DEFAULT_PLAN_NAME},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let admin_id = ensure_user(&pool, "Store Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "Sample Customer", "user@example.com", "user1234", "user").await?;
    let category_id = ensure_category(&pool, PUBLIC_CATEGORY).await?;
    ensure_category(&pool, "Apparel").await?;
    seed_settings(&pool).await?;
    seed_default_plan(&pool).await?;
    seed_products(&pool, category_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (id, currency_code, delivery_cost)
        SELECT $1, $2, $3
        WHERE NOT EXISTS (SELECT 1 FROM app_settings)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(DEFAULT_CURRENCY)
    .bind(parse_price("4.99"))
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_default_plan(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plan_limits (id, plan_name, plan_type)
        VALUES ($1, $2, 'monthly')
        ON CONFLICT (plan_name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(DEFAULT_PLAN_NAME)
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, category_id: Uuid) -> anyhow::Result<()> {
    let products = [
        ("Canvas Tote", "Everyday carry bag", "24.00", None, true),
        ("Ceramic Mug", "Holds 350 ml of coffee", "12.50", Some("9.99"), false),
        ("Sticker Pack", "Ten vinyl stickers", "5", None, false),
        ("Wool Beanie", "Warm knit hat", "$19.90", Some("15"), true),
    ];

    for (name, desc, price, sale_price, is_hot) in products {
        let sale_price = sale_price.map(parse_price);
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, sale_price, category_id, is_hot, on_sale)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(parse_price(price))
        .bind(sale_price)
        .bind(category_id)
        .bind(is_hot)
        .bind(sale_price.is_some())
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
