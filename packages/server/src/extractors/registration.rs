use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::registration::RegistrationAction;
use crate::state::AppState;
use crate::utils::upload::{self, UploadedFile};

const ACTIONS: &[&str] = &["send_otp", "verify_otp", "register_team"];

/// Multipart field carrying the payment screenshot.
pub const SCREENSHOT_FIELD: &str = "paymentScreenshot";

/// A registration workflow request, accepted as JSON or as multipart form
/// data. Only `register_team` keeps an uploaded screenshot; for the other
/// actions, or when decoding fails, the upload is removed again.
pub struct RegistrationRequest {
    pub action: RegistrationAction,
    pub screenshot: Option<UploadedFile>,
}

impl FromRequest<AppState> for RegistrationRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let AppJson(body) = AppJson::<Map<String, Value>>::from_request(req, state).await?;
            return Ok(RegistrationRequest {
                action: decode_action(body)?,
                screenshot: None,
            });
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
        let form = upload::read_form(
            multipart,
            SCREENSHOT_FIELD,
            &upload::SCREENSHOT,
            &*state.store,
            state.config.upload.max_screenshot_bytes,
        )
        .await?;

        let body = form
            .fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let mut screenshot = form.file;

        let action = match decode_action(body) {
            Ok(action) => action,
            Err(e) => {
                if let Some(file) = &screenshot {
                    file.discard(&*state.store).await;
                }
                return Err(e);
            }
        };

        if !matches!(action, RegistrationAction::RegisterTeam(_))
            && let Some(file) = screenshot.take()
        {
            file.discard(&*state.store).await;
        }

        Ok(RegistrationRequest { action, screenshot })
    }
}

/// Select the workflow step named by the `action` field.
pub fn decode_action(body: Map<String, Value>) -> Result<RegistrationAction, AppError> {
    let known = body
        .get("action")
        .and_then(Value::as_str)
        .is_some_and(|a| ACTIONS.contains(&a));
    if !known {
        return Err(AppError::Validation("Invalid action".into()));
    }

    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}
