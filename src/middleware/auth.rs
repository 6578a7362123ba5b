use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::users::{self, Entity as Users},
    error::AppError,
    models::UserRole,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role.as_str() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        decode_token(token, &state.config.jwt_secret)
    }
}

/// Replace the token's role with the account's current one. Deleted or
/// deactivated accounts lose access even while their token is unexpired.
pub fn refresh_role(user: AuthUser, account: Option<users::Model>) -> Result<AuthUser, AppError> {
    let account =
        account.ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;
    if !account.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }
    Ok(AuthUser {
        user_id: user.user_id,
        role: account.role,
    })
}

/// Extractor for routes that only administrators may call.
///
/// The token must carry the admin role and the account must still be an
/// active admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_admin(&user)?;

        let account = Users::find_by_id(user.user_id).one(&state.orm).await?;
        let user = refresh_role(user, account)?;
        ensure_admin(&user)?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(role: &str, secret: &str, exp_offset: i64) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id.to_string(),
            role: role.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (id, token)
    }

    #[test]
    fn decodes_valid_token() {
        let (id, token) = token("admin", "s3cret", 3600);
        let user = decode_token(&token, "s3cret").unwrap();
        assert_eq!(user.user_id, id);
        assert!(ensure_admin(&user).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let (_, token_a) = token("admin", "s3cret", 3600);
        assert!(matches!(
            decode_token(&token_a, "other"),
            Err(AppError::Unauthorized(_))
        ));

        let (_, token_b) = token("admin", "s3cret", -3600);
        assert!(decode_token(&token_b, "s3cret").is_err());
    }

    #[test]
    fn non_admins_are_forbidden() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: "user".into(),
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }

    fn account(id: Uuid, role: &str, is_active: bool) -> users::Model {
        users::Model {
            id,
            name: "Ops".into(),
            email: "ops@example.com".into(),
            photo_url: None,
            role: role.into(),
            is_active,
            password_hash: None,
            created_at: chrono::Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn stale_admin_tokens_follow_the_stored_account() {
        let id = Uuid::new_v4();
        let claims = AuthUser {
            user_id: id,
            role: "admin".into(),
        };

        let current = refresh_role(claims.clone(), Some(account(id, "admin", true))).unwrap();
        assert!(ensure_admin(&current).is_ok());

        let demoted = refresh_role(claims.clone(), Some(account(id, "user", true))).unwrap();
        assert!(matches!(ensure_admin(&demoted), Err(AppError::Forbidden)));

        assert!(matches!(
            refresh_role(claims.clone(), Some(account(id, "admin", false))),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            refresh_role(claims, None),
            Err(AppError::Unauthorized(_))
        ));
    }
}
