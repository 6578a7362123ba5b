use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::settings::UpdateSettingsRequest,
    entity::app_settings::{ActiveModel, Column, Entity as Settings},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::AppSettings,
    pricing::PriceInput,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Stored settings, or the defaults while no row exists yet.
pub async fn current_settings(state: &AppState) -> AppResult<AppSettings> {
    let row = Settings::find()
        .order_by_asc(Column::UpdatedAt)
        .one(&state.orm)
        .await?;
    Ok(row.map(AppSettings::from).unwrap_or_default())
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<AppSettings>> {
    let settings = current_settings(state).await?;
    Ok(ApiResponse::success("Settings", settings, Some(Meta::empty())))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<AppSettings>> {
    let currency_code = normalize_currency(&payload.currency_code)?;
    let delivery_cost = validated_delivery_cost(&payload.delivery_cost)?;

    let existing = Settings::find()
        .order_by_asc(Column::UpdatedAt)
        .one(&state.orm)
        .await?;

    let saved = match existing {
        Some(row) => {
            let mut active: ActiveModel = row.into();
            active.currency_code = Set(currency_code);
            active.delivery_cost = Set(delivery_cost);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            ActiveModel {
                id: Set(Uuid::new_v4()),
                currency_code: Set(currency_code),
                delivery_cost: Set(delivery_cost),
                updated_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "settings_update",
        "app_settings",
        serde_json::json!({
            "currency_code": saved.currency_code,
            "delivery_cost": saved.delivery_cost,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings saved",
        saved.into(),
        Some(Meta::empty()),
    ))
}

fn validated_delivery_cost(input: &PriceInput) -> AppResult<i64> {
    if !input.is_valid() {
        return Err(AppError::BadRequest("Please enter a valid delivery cost".into()));
    }
    Ok(input.to_cents())
}

fn normalize_currency(raw: &str) -> AppResult<String> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::BadRequest(
            "Currency code must be three letters, e.g. USD".into(),
        ));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_codes_are_upper_cased() {
        assert_eq!(normalize_currency(" eur ").unwrap(), "EUR");
        assert!(normalize_currency("EURO").is_err());
        assert!(normalize_currency("U$D").is_err());
        assert!(normalize_currency("").is_err());
    }

    #[test]
    fn delivery_cost_must_fit_in_cents() {
        assert_eq!(validated_delivery_cost(&PriceInput::from("4.99")).unwrap(), 499);
        assert_eq!(validated_delivery_cost(&PriceInput::from("0")).unwrap(), 0);
        assert!(validated_delivery_cost(&PriceInput::from("99999999999999999999")).is_err());
        assert!(validated_delivery_cost(&PriceInput::from("free")).is_err());
    }
}
