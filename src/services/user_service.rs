use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{UpdateUserRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{User, UserRole},
    response::{ApiResponse, Meta},
    routes::params::UserQuery,
    services::{like_pattern, non_empty},
    state::AppState,
};

pub async fn list_users(state: &AppState, query: UserQuery) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().and_then(non_empty) {
        let pattern = like_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Email).ilike(pattern)),
        );
    }
    if let Some(role) = query.role.as_deref().and_then(non_empty) {
        let role = parse_role(&role)?;
        condition = condition.add(Column::Role.eq(role.as_str()));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = find_user(state, id).await?;
    Ok(ApiResponse::success("User", user.into(), None))
}

pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = find_user(state, id).await?;
    let previous_photo = existing.photo_url.clone();

    let role = payload.role.as_deref().map(parse_role).transpose()?;
    ensure_keeps_own_access(actor, id, role, payload.is_active)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name =
            non_empty(&name).ok_or_else(|| AppError::BadRequest("Name is required".into()))?;
        active.name = Set(name);
    }

    let mut replaced_photo = None;
    if let Some(photo_url) = payload.photo_url {
        let photo_url = non_empty(photo_url);
        if photo_url != previous_photo {
            replaced_photo = previous_photo;
            active.photo_url = Set(photo_url);
        }
    }
    if let Some(role) = role {
        active.role = Set(role.as_str().to_string());
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let user = active.update(&state.orm).await?;

    if let Some(old) = replaced_photo {
        state.storage.delete_quietly(&old).await;
    }

    audit::record(
        &state.pool,
        actor.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role, "is_active": user.is_active }),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated",
        user.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_not_self(actor, id)?;

    let existing = find_user(state, id).await?;
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Some(url) = existing.photo_url.as_deref() {
        state.storage.delete_quietly(url).await;
    }

    audit::record(
        &state.pool,
        actor.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id, "email": existing.email }),
    )
    .await;

    Ok(ApiResponse::deleted("User", id))
}

pub(crate) async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn parse_role(raw: &str) -> AppResult<UserRole> {
    raw.parse::<UserRole>().map_err(AppError::BadRequest)
}

/// An admin may edit their own profile but not demote or deactivate it.
fn ensure_keeps_own_access(
    actor: &AuthUser,
    id: Uuid,
    role: Option<UserRole>,
    is_active: Option<bool>,
) -> AppResult<()> {
    if id != actor.user_id {
        return Ok(());
    }
    let demoted = role.is_some_and(|r| r != UserRole::Admin);
    let deactivated = is_active == Some(false);
    if demoted || deactivated {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin access".into(),
        ));
    }
    Ok(())
}

fn ensure_not_self(actor: &AuthUser, id: Uuid) -> AppResult<()> {
    if id == actor.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: "admin".into(),
        }
    }

    #[test]
    fn admins_cannot_lock_themselves_out() {
        let actor = admin();
        let me = actor.user_id;

        assert!(ensure_keeps_own_access(&actor, me, Some(UserRole::Admin), Some(true)).is_ok());
        assert!(ensure_keeps_own_access(&actor, me, None, None).is_ok());
        assert!(matches!(
            ensure_keeps_own_access(&actor, me, Some(UserRole::User), None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            ensure_keeps_own_access(&actor, me, None, Some(false)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn other_accounts_can_be_demoted_and_deleted() {
        let actor = admin();
        let other = Uuid::new_v4();

        assert!(ensure_keeps_own_access(&actor, other, Some(UserRole::User), Some(false)).is_ok());
        assert!(ensure_not_self(&actor, other).is_ok());
        assert!(matches!(
            ensure_not_self(&actor, actor.user_id),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn roles_parse_or_reject() {
        assert_eq!(parse_role("admin").unwrap(), UserRole::Admin);
        assert!(parse_role("owner").is_err());
    }
}
