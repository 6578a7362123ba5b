use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    pricing::PriceInput,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{category_service::find_category, like_pattern, non_empty},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_deref().and_then(non_empty) {
        let pattern = like_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, Column::Description)).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(is_hot) = query.is_hot {
        condition = condition.add(Column::IsHot.eq(is_hot));
    }
    if let Some(is_new) = query.is_new {
        condition = condition.add(Column::IsNew.eq(is_new));
    }
    if let Some(on_sale) = query.on_sale {
        condition = condition.add(Column::OnSale.eq(on_sale));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let total = Products::find()
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let mut finder = Products::find()
        .filter(condition)
        .find_also_related(Categories);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| Product::from_parts(product, category))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = load_product(state, id).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let name = non_empty(&payload.name)
        .ok_or_else(|| AppError::BadRequest("Product name is required".into()))?;
    let price = validated_price(&payload.price)?;
    let sale_price = match payload.sale_price.as_ref() {
        Some(input) => validated_sale_price(input)?,
        None => None,
    };
    ensure_sale_below_price(price, sale_price)?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.and_then(non_empty)),
        price: Set(price),
        sale_price: Set(sale_price),
        category_id: Set(payload.category_id),
        image_urls: Set(clean_urls(payload.image_urls)),
        is_hot: Set(payload.is_hot),
        is_new: Set(payload.is_new),
        on_sale: Set(payload.on_sale),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = load_product(state, product.id).await?;
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(state, id).await?;

    let price = match payload.price.as_ref() {
        Some(input) => validated_price(input)?,
        None => existing.price,
    };
    let sale_price = match payload.sale_price.as_ref() {
        Some(input) => validated_sale_price(input)?,
        None => existing.sale_price,
    };
    ensure_sale_below_price(price, sale_price)?;

    let category_id = if payload.clear_category {
        None
    } else if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
        Some(category_id)
    } else {
        existing.category_id
    };

    let mut removed_images = Vec::new();
    let image_urls = match payload.image_urls {
        Some(urls) => {
            let urls = clean_urls(urls);
            removed_images = existing
                .image_urls
                .iter()
                .filter(|old| !urls.contains(old))
                .cloned()
                .collect();
            urls
        }
        None => existing.image_urls.clone(),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = non_empty(&name)
            .ok_or_else(|| AppError::BadRequest("Product name is required".into()))?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(non_empty(description));
    }
    active.price = Set(price);
    active.sale_price = Set(sale_price);
    active.category_id = Set(category_id);
    active.image_urls = Set(image_urls);
    if let Some(is_hot) = payload.is_hot {
        active.is_hot = Set(is_hot);
    }
    if let Some(is_new) = payload.is_new {
        active.is_new = Set(is_new);
    }
    if let Some(on_sale) = payload.on_sale {
        active.on_sale = Set(on_sale);
    }

    let product = active.update(&state.orm).await?;

    for url in &removed_images {
        state.storage.delete_quietly(url).await;
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id, "removed_images": removed_images.len() }),
    )
    .await;

    let product = load_product(state, product.id).await?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_product(state, id).await?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    for url in &existing.image_urls {
        state.storage.delete_quietly(url).await;
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::deleted("Product", id))
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn load_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Product::from_parts(product, category))
}

async fn ensure_category_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    match find_category(state, id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound) => Err(AppError::BadRequest(format!(
            "Category {id} does not exist"
        ))),
        Err(err) => Err(err),
    }
}

fn validated_price(input: &PriceInput) -> AppResult<i64> {
    if !input.is_valid() {
        return Err(AppError::BadRequest("Please enter a valid price".into()));
    }
    Ok(input.to_cents())
}

/// Blank clears the sale price; anything else must be a valid price.
fn validated_sale_price(input: &PriceInput) -> AppResult<Option<i64>> {
    if input.as_text().trim().is_empty() {
        return Ok(None);
    }
    if !input.is_valid() {
        return Err(AppError::BadRequest("Please enter a valid sale price".into()));
    }
    Ok(input.to_database())
}

fn ensure_sale_below_price(price: i64, sale_price: Option<i64>) -> AppResult<()> {
    match sale_price {
        Some(sale) if sale >= price => Err(AppError::BadRequest(
            "Sale price must be lower than the regular price".into(),
        )),
        _ => Ok(()),
    }
}

fn clean_urls(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls.into_iter().filter_map(non_empty) {
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_validated_and_normalized() {
        assert_eq!(validated_price(&PriceInput::from("19.999")).unwrap(), 2000);
        assert_eq!(validated_price(&PriceInput::Number(5.0)).unwrap(), 500);
        assert!(validated_price(&PriceInput::from("")).is_err());
        assert!(validated_price(&PriceInput::from("-2")).is_err());
        assert!(validated_price(&PriceInput::from("99999999999999999999")).is_err());
        assert!(validated_sale_price(&PriceInput::Number(1e20)).is_err());
    }

    #[test]
    fn sale_price_blank_clears_and_zero_is_absent() {
        assert_eq!(validated_sale_price(&PriceInput::from(" ")).unwrap(), None);
        assert_eq!(validated_sale_price(&PriceInput::from("0")).unwrap(), None);
        assert_eq!(validated_sale_price(&PriceInput::from("4.5")).unwrap(), Some(450));
        assert!(validated_sale_price(&PriceInput::from("x")).is_err());
    }

    #[test]
    fn sale_must_undercut_price() {
        assert!(ensure_sale_below_price(1000, Some(999)).is_ok());
        assert!(ensure_sale_below_price(1000, None).is_ok());
        assert!(ensure_sale_below_price(1000, Some(1000)).is_err());
    }

    #[test]
    fn image_urls_are_trimmed_and_deduplicated() {
        let urls = clean_urls(vec![
            " https://a/x.png ".into(),
            "".into(),
            "https://a/x.png".into(),
            "https://a/y.png".into(),
        ]);
        assert_eq!(urls, vec!["https://a/x.png", "https://a/y.png"]);
    }
}
