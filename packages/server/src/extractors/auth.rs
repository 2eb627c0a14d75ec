use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use sea_orm::EntityTrait;

use crate::entity::admin::{self, Permission};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "portal_session";

/// Authenticated admin, loaded fresh from the database on every request.
///
/// The token is read from the session cookie, falling back to an
/// `Authorization: Bearer <token>` header. Permission checks happen via
/// `require()` in the handler body.
pub struct AdminSession {
    pub admin: admin::Model,
}

impl AdminSession {
    pub fn id(&self) -> i32 {
        self.admin.id
    }

    /// Returns `Ok(())` if the admin holds `permission`, `Err(PermissionDenied)` otherwise.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.admin.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(permission.as_str()))
        }
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AppError::TokenMissing)?;

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::SessionInvalid)?;

        let admin = admin::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .filter(|a| a.is_active)
            .ok_or(AppError::SessionInvalid)?;

        if let Some(until) = admin.lock_until
            && until > Utc::now()
        {
            return Err(AppError::AccountLocked { until });
        }

        Ok(AdminSession { admin })
    }
}
