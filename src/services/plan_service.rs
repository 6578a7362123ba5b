use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::plans::{AssignPlanRequest, PlanAssignment, PlanLimitList, PlanLimitRequest},
    entity::{
        plan_limits::{ActiveModel, Column, Entity as PlanLimits, Model as PlanModel},
        user_plans::{
            ActiveModel as UserPlanActive, Column as UserPlanCol, Entity as UserPlans,
            Model as UserPlanModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::PlanLimit,
    response::{ApiResponse, Meta},
    services::{lower_eq, non_empty, user_service::find_user},
    state::AppState,
};

pub const PLAN_TYPES: [&str; 2] = ["monthly", "yearly"];

/// Plan used when a user has no assignment of their own.
pub const DEFAULT_PLAN_NAME: &str = "Pro";

pub async fn list_plans(state: &AppState) -> AppResult<ApiResponse<PlanLimitList>> {
    let items: Vec<PlanLimit> = PlanLimits::find()
        .order_by_asc(Column::PlanName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PlanLimit::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Plan limits",
        PlanLimitList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_plan(state: &AppState, id: Uuid) -> AppResult<ApiResponse<PlanLimit>> {
    let plan = find_plan(state, id).await?;
    Ok(ApiResponse::success("Plan limit", plan.into(), None))
}

pub async fn create_plan(
    state: &AppState,
    user: &AuthUser,
    payload: PlanLimitRequest,
) -> AppResult<ApiResponse<PlanLimit>> {
    let (name, plan_type) = validate_plan(&payload)?;
    ensure_name_available(state, &name, None).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        plan_name: Set(name),
        plan_type: Set(plan_type),
        database_size_mb: Set(payload.database_size_mb),
        max_users: Set(payload.max_users),
        storage_mb: Set(payload.storage_mb),
        api_requests: Set(payload.api_requests),
        realtime_connections: Set(payload.realtime_connections),
        realtime_messages: Set(payload.realtime_messages),
        edge_functions_invocations: Set(payload.edge_functions_invocations),
        edge_functions_execution_time_hours: Set(payload.edge_functions_execution_time_hours),
        is_active: Set(payload.is_active),
        created_at: NotSet,
    };
    let plan = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "plan_create",
        "plan_limits",
        serde_json::json!({ "plan_id": plan.id, "plan_name": plan.plan_name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Plan created successfully",
        plan.into(),
        Some(Meta::empty()),
    ))
}

/// Replaces every field of the plan with the submitted form.
pub async fn update_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PlanLimitRequest,
) -> AppResult<ApiResponse<PlanLimit>> {
    let (name, plan_type) = validate_plan(&payload)?;
    let existing = find_plan(state, id).await?;
    ensure_name_available(state, &name, Some(id)).await?;

    let mut active: ActiveModel = existing.into();
    active.plan_name = Set(name);
    active.plan_type = Set(plan_type);
    active.database_size_mb = Set(payload.database_size_mb);
    active.max_users = Set(payload.max_users);
    active.storage_mb = Set(payload.storage_mb);
    active.api_requests = Set(payload.api_requests);
    active.realtime_connections = Set(payload.realtime_connections);
    active.realtime_messages = Set(payload.realtime_messages);
    active.edge_functions_invocations = Set(payload.edge_functions_invocations);
    active.edge_functions_execution_time_hours =
        Set(payload.edge_functions_execution_time_hours);
    active.is_active = Set(payload.is_active);
    let plan = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "plan_update",
        "plan_limits",
        serde_json::json!({ "plan_id": plan.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Plan updated successfully",
        plan.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = PlanLimits::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "plan_delete",
        "plan_limits",
        serde_json::json!({ "plan_id": id }),
    )
    .await;

    Ok(ApiResponse::deleted("Plan", id))
}

pub async fn assign_plan(
    state: &AppState,
    user: &AuthUser,
    plan_id: Uuid,
    payload: AssignPlanRequest,
) -> AppResult<ApiResponse<PlanAssignment>> {
    let plan = find_plan(state, plan_id).await?;
    if !plan.is_active {
        return Err(AppError::BadRequest(format!(
            "Plan '{}' is not active",
            plan.plan_name
        )));
    }
    find_user(state, payload.user_id).await?;

    let now = Utc::now();
    if payload.expires_at.is_some_and(|at| at <= now) {
        return Err(AppError::BadRequest("expires_at must be in the future".into()));
    }

    let assignment = UserPlanActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        plan_id: Set(plan.id),
        assigned_at: Set(now.into()),
        expires_at: Set(payload.expires_at.map(Into::into)),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "plan_assign",
        "user_plans",
        serde_json::json!({ "plan_id": plan.id, "user_id": assignment.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Plan assigned",
        assignment_view(assignment),
        Some(Meta::empty()),
    ))
}

/// Most recent unexpired assignment for `user_id`, with its plan.
pub async fn current_assignment(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<Option<(UserPlanModel, PlanModel)>> {
    let now = Utc::now();
    let row = UserPlans::find()
        .filter(UserPlanCol::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(UserPlanCol::ExpiresAt.is_null())
                .add(UserPlanCol::ExpiresAt.gt(now)),
        )
        .order_by_desc(UserPlanCol::AssignedAt)
        .find_also_related(PlanLimits)
        .one(&state.orm)
        .await?;

    Ok(row.and_then(|(assignment, plan)| plan.map(|plan| (assignment, plan))))
}

pub async fn default_plan(state: &AppState) -> AppResult<Option<PlanModel>> {
    let plan = PlanLimits::find()
        .filter(Column::PlanName.eq(DEFAULT_PLAN_NAME))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    Ok(plan)
}

async fn find_plan(state: &AppState, id: Uuid) -> AppResult<PlanModel> {
    PlanLimits::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn ensure_name_available(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = PlanLimits::find().filter(lower_eq(Column::PlanName, name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "A plan named '{name}' already exists"
        )));
    }
    Ok(())
}

fn validate_plan(payload: &PlanLimitRequest) -> AppResult<(String, String)> {
    let name = non_empty(&payload.plan_name)
        .ok_or_else(|| AppError::BadRequest("Plan name is required".into()))?;

    let plan_type = payload.plan_type.trim().to_ascii_lowercase();
    if !PLAN_TYPES.contains(&plan_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "plan_type must be one of {}",
            PLAN_TYPES.join(", ")
        )));
    }

    if let Some((field, _)) = payload.limits().into_iter().find(|(_, value)| *value < 0) {
        return Err(AppError::BadRequest(format!("{field} cannot be negative")));
    }

    Ok((name, plan_type))
}

fn assignment_view(model: UserPlanModel) -> PlanAssignment {
    PlanAssignment {
        id: model.id,
        user_id: model.user_id,
        plan_id: model.plan_id,
        assigned_at: model.assigned_at.with_timezone(&Utc),
        expires_at: model.expires_at.map(|at| at.with_timezone(&Utc)),
    }
}
