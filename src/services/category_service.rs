use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Category, is_public_category},
    response::{ApiResponse, Meta},
    services::{lower_eq, non_empty},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let total = items.len() as i64;
    let data = CategoryList { items };
    Ok(ApiResponse::success(
        "Categories",
        data,
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = find_category(state, id).await?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = non_empty(&payload.name)
        .ok_or_else(|| AppError::BadRequest("Category name is required".into()))?;
    ensure_name_available(state, &name, None).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.and_then(non_empty)),
        image_url: Set(payload.image_url.and_then(non_empty)),
        created_at: NotSet,
    };
    let category = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id, "name": category.name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing = find_category(state, id).await?;
    let previous_image = existing.image_url.clone();
    let protected = is_public_category(&existing.name);
    let current_name = existing.name.clone();

    let mut active: ActiveModel = existing.into();

    if let Some(name) = payload.name {
        let name = non_empty(&name)
            .ok_or_else(|| AppError::BadRequest("Category name is required".into()))?;
        if name != current_name {
            if protected {
                return Err(AppError::BadRequest(
                    "The public category name cannot be changed".into(),
                ));
            }
            ensure_name_available(state, &name, Some(id)).await?;
            active.name = Set(name);
        }
    }
    if let Some(description) = payload.description {
        active.description = Set(non_empty(description));
    }

    let mut replaced_image = None;
    if let Some(image_url) = payload.image_url {
        let image_url = non_empty(image_url);
        if image_url != previous_image {
            replaced_image = previous_image;
            active.image_url = Set(image_url);
        }
    }

    let category = active.update(&state.orm).await?;

    if let Some(old) = replaced_image {
        state.storage.delete_quietly(&old).await;
    }

    audit::record(
        &state.pool,
        user.user_id,
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_category(state, id).await?;
    if is_public_category(&existing.name) {
        return Err(AppError::BadRequest(
            "Cannot delete the public category".into(),
        ));
    }

    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Some(url) = existing.image_url.as_deref() {
        state.storage.delete_quietly(url).await;
    }

    audit::record(
        &state.pool,
        user.user_id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id, "name": existing.name }),
    )
    .await;

    Ok(ApiResponse::deleted("Category", id))
}

pub(crate) async fn find_category(state: &AppState, id: Uuid) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_name_available(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Categories::find().filter(lower_eq(Column::Name, name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "A category named '{name}' already exists"
        )));
    }
    Ok(())
}
