use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

static EXPOSE_INTERNAL_DETAIL: AtomicBool = AtomicBool::new(false);

/// Include the underlying cause of internal errors in responses.
/// Only enabled outside production.
pub fn expose_internal_detail(enabled: bool) {
    EXPOSE_INTERNAL_DETAIL.store(enabled, Ordering::Relaxed);
}

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `CONFLICT`,
    /// `OTP_INVALID`, `TOKEN_MISSING`, `SESSION_INVALID`, `INVALID_CREDENTIALS`,
    /// `ACCOUNT_DISABLED`, `PERMISSION_DENIED`, `NOT_FOUND`, `ACCOUNT_LOCKED`,
    /// `RATE_LIMITED`, `EXTERNAL_SERVICE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "All team leader details are required")]
    pub message: String,
    /// Itemized field errors, when more than one input was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Underlying cause of an internal error. Never present in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            errors: None,
            detail: None,
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Several inputs rejected at once.
    InvalidFields(Vec<String>),
    /// Duplicate email, enrollment, team name or transaction id.
    Conflict(String),
    OtpInvalid,
    TokenMissing,
    SessionInvalid,
    InvalidCredentials,
    AccountDisabled,
    AccountLocked {
        until: DateTime<Utc>,
    },
    /// Carries the name of the missing permission.
    PermissionDenied(&'static str),
    NotFound(String),
    /// Login rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    /// Mail or CAPTCHA provider failure. The message is shown to clients as-is
    /// and must not carry provider details.
    ExternalService(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidFields(_)
            | AppError::Conflict(_)
            | AppError::OtpInvalid => StatusCode::BAD_REQUEST,
            AppError::TokenMissing
            | AppError::SessionInvalid
            | AppError::InvalidCredentials
            | AppError::AccountDisabled => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccountLocked { .. } => StatusCode::LOCKED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExternalService(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn into_body(self) -> ErrorBody {
        match self {
            AppError::Validation(msg) => ErrorBody::new("VALIDATION_ERROR", msg),
            AppError::InvalidFields(errors) => ErrorBody {
                errors: Some(errors),
                ..ErrorBody::new("VALIDATION_ERROR", "Validation failed")
            },
            AppError::Conflict(msg) => ErrorBody::new("CONFLICT", msg),
            AppError::OtpInvalid => ErrorBody::new("OTP_INVALID", "Invalid or expired OTP"),
            AppError::TokenMissing => ErrorBody::new(
                "TOKEN_MISSING",
                "Authentication required. Please login first.",
            ),
            AppError::SessionInvalid => {
                ErrorBody::new("SESSION_INVALID", "Invalid session. Please login again.")
            }
            AppError::InvalidCredentials => {
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid credentials")
            }
            AppError::AccountDisabled => {
                ErrorBody::new("ACCOUNT_DISABLED", "Account is deactivated")
            }
            AppError::AccountLocked { until } => ErrorBody::new(
                "ACCOUNT_LOCKED",
                format!(
                    "Account is locked due to multiple failed login attempts. Please try again after {}.",
                    until.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
            AppError::PermissionDenied(permission) => ErrorBody::new(
                "PERMISSION_DENIED",
                format!("Permission denied. Required permission: {permission}"),
            ),
            AppError::NotFound(msg) => ErrorBody::new("NOT_FOUND", msg),
            AppError::RateLimited { retry_after } => ErrorBody::new(
                "RATE_LIMITED",
                format!(
                    "Too many login attempts. Please try again in {} minutes.",
                    retry_after.div_ceil(60).max(1)
                ),
            ),
            AppError::ExternalService(msg) => ErrorBody::new("EXTERNAL_SERVICE_ERROR", msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                let detail = EXPOSE_INTERNAL_DETAIL
                    .load(Ordering::Relaxed)
                    .then_some(detail);
                ErrorBody {
                    detail,
                    ..ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred")
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let mut response = (status, Json(self.into_body())).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::SizeLimitExceeded { limit, .. } => AppError::Validation(format!(
                "File too large. Maximum size allowed is {}MB.",
                limit / (1024 * 1024)
            )),
            other => AppError::Internal(other.to_string()),
        }
    }
}
