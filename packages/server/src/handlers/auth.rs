use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::entity::admin;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AdminSession, SESSION_COOKIE};
use crate::extractors::client::ClientIp;
use crate::extractors::json::AppJson;
use crate::models::auth::{AdminProfile, LoginRequest, LoginResponse, MeResponse};
use crate::models::shared::{MessageResponse, non_blank};
use crate::state::AppState;
use crate::utils::email::normalize_email;
use crate::utils::lockout::LoginAttempts;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "adminLogin",
    summary = "Log in as an admin",
    description = "Checks the per-client rate limit, then the account lock, then the password. \
        Five consecutive wrong passwords lock the account for two hours. On success the \
        session token is set as an HttpOnly cookie and also returned in the body.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong credentials or deactivated (INVALID_CREDENTIALS, ACCOUNT_DISABLED)", body = ErrorBody),
        (status = 423, description = "Account locked (ACCOUNT_LOCKED)", body = ErrorBody),
        (status = 429, description = "Too many attempts from this client (RATE_LIMITED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(client = %client_ip))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .login_limiter
        .check(&client_ip)
        .map_err(|retry_after| AppError::RateLimited { retry_after })?;

    let (Some(email), Some(password)) = (
        non_blank(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation("Email and password are required".into()));
    };
    let email = normalize_email(email);

    let Some(account) = admin::Entity::find()
        .filter(admin::Column::Email.eq(&email))
        .one(&state.db)
        .await?
    else {
        state.login_limiter.record_failure(&client_ip);
        return Err(AppError::InvalidCredentials);
    };

    let now = Utc::now();
    if let Some(until) = account.lock_until
        && account.is_locked(now)
    {
        return Err(AppError::AccountLocked { until });
    }
    if !account.is_active {
        return Err(AppError::AccountDisabled);
    }

    let is_valid = hash::verify_password(password, &account.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        let attempts = LoginAttempts {
            count: account.login_attempts,
            lock_until: account.lock_until,
        }
        .after_failure(now);

        let mut active: admin::ActiveModel = account.into();
        active.login_attempts = Set(attempts.count);
        active.lock_until = Set(attempts.lock_until);
        active.updated_at = Set(now);
        let updated = active.update(&state.db).await?;

        if updated.is_locked(now) {
            warn!(admin_id = updated.id, "Admin account locked after repeated failures");
        }
        state.login_limiter.record_failure(&client_ip);
        return Err(AppError::InvalidCredentials);
    }

    let reset = LoginAttempts::after_success();
    let mut active: admin::ActiveModel = account.into();
    active.login_attempts = Set(reset.count);
    active.lock_until = Set(reset.lock_until);
    active.last_login = Set(Some(now));
    active.updated_at = Set(now);
    let account = active.update(&state.db).await?;

    state.login_limiter.reset(&client_ip);

    let token = jwt::sign(
        account.id,
        &account.email,
        &state.config.auth.jwt_secret,
        state.config.auth.session_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.auth.cookie_secure);

    info!(admin_id = account.id, "Admin logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            message: "Login successful".into(),
            token,
            admin: AdminProfile::from(&account),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "adminLogout",
    summary = "Log out",
    description = "Clears the session cookie. Bearer tokens stay valid until they expire.",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, jar), fields(admin_id = session.id()))]
pub async fn logout(session: AdminSession, jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(MessageResponse::ok("Logout successful")),
    )
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "adminMe",
    summary = "Current admin",
    responses(
        (status = 200, description = "Logged-in admin", body = MeResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session), fields(admin_id = session.id()))]
pub async fn me(session: AdminSession) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        admin: AdminProfile::from(&session.admin),
    })
}
