use axum::{
    Json,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::OtpPurpose;
use tracing::{info, instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::client::ClientIp;
use crate::extractors::registration::RegistrationRequest;
use crate::models::registration::{
    OtpSentResponse, RegisterTeamRequest, RegistrationAction, SendOtpRequest, TEAM_SIZE,
    TeamRegisteredResponse, VerifyOtpRequest,
};
use crate::models::shared::{MessageResponse, non_blank};
use crate::otp::OtpService;
use crate::registry::{PaymentEvidence, TeamRegistry};
use crate::state::AppState;
use crate::utils::email::{is_valid_email, normalize_email};
use crate::utils::upload::UploadedFile;

/// Registration carries a screenshot; leave room for form fields around it.
pub fn registration_body_limit(max_screenshot_bytes: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_screenshot_bytes as usize + 64 * 1024)
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Registration",
    operation_id = "register",
    summary = "Team registration workflow",
    description = "Dispatches on the `action` field. `send_otp` (`email`, `name`) mails a \
        registration code to the prospective leader. `verify_otp` (`email`, `otp`) consumes it. \
        `register_team` is sent as multipart form data with the leader fields, \
        `member{2..6}{Name,Enrollment,Email}`, `transactionId`, `recaptchaToken` and the \
        `paymentScreenshot` file; all six members are required and the leader email must have \
        been verified within the code lifetime.",
    request_body(content = RegisterTeamRequest, content_type = "multipart/form-data",
        description = "Form fields plus `action`; JSON is accepted for send_otp and verify_otp"),
    responses(
        (status = 200, description = "OTP sent or verified", body = OtpSentResponse),
        (status = 201, description = "Team registered", body = TeamRegisteredResponse),
        (status = 400, description = "Validation failure, conflict or bad code (VALIDATION_ERROR, CONFLICT, OTP_INVALID)", body = ErrorBody),
        (status = 500, description = "Mail or CAPTCHA provider failure (EXTERNAL_SERVICE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request), fields(client = %client_ip))]
pub async fn register(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    request: RegistrationRequest,
) -> Result<Response, AppError> {
    let RegistrationRequest { action, screenshot } = request;
    match action {
        RegistrationAction::SendOtp(req) => Ok(send_otp(&state, req).await?.into_response()),
        RegistrationAction::VerifyOtp(req) => Ok(verify_otp(&state, req).await?.into_response()),
        RegistrationAction::RegisterTeam(req) => {
            let result = register_team(&state, *req, screenshot.as_ref(), &client_ip).await;
            if result.is_err()
                && let Some(file) = &screenshot
            {
                file.discard(&*state.store).await;
            }
            Ok(result?.into_response())
        }
    }
}

async fn send_otp(state: &AppState, req: SendOtpRequest) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(name)) = (
        non_blank(req.email.as_deref()),
        non_blank(req.name.as_deref()),
    ) else {
        return Err(AppError::Validation("Email and name are required".into()));
    };
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Please enter a valid email address".into()));
    }

    if let Some(member) = TeamRegistry::new(&state.db).member_by_email(&email).await? {
        let role = if member.is_leader() { "team leader" } else { "team member" };
        return Err(AppError::Validation(format!(
            "This email is already registered as {role}"
        )));
    }

    OtpService::new(&state.db, state.otp_ttl())
        .issue(&*state.mailer, &email, name, OtpPurpose::TeamRegistration)
        .await?;

    Ok(Json(OtpSentResponse {
        success: true,
        message: format!("OTP sent to {email}"),
        expires_in: format!("{} minutes", state.config.otp.ttl_minutes),
    }))
}

async fn verify_otp(
    state: &AppState,
    req: VerifyOtpRequest,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(code)) = (
        non_blank(req.email.as_deref()),
        non_blank(req.otp.as_deref()),
    ) else {
        return Err(AppError::Validation("Email and OTP are required".into()));
    };
    let email = normalize_email(email);

    let verified = OtpService::new(&state.db, state.otp_ttl())
        .verify(&email, code, OtpPurpose::TeamRegistration)
        .await?;
    if !verified {
        return Err(AppError::OtpInvalid);
    }

    info!(%email, "Registration email verified");
    Ok(Json(MessageResponse::ok("Email verified successfully")))
}

async fn register_team(
    state: &AppState,
    req: RegisterTeamRequest,
    screenshot: Option<&UploadedFile>,
    client_ip: &str,
) -> Result<impl IntoResponse, AppError> {
    verify_captcha(state, req.recaptcha_token.as_deref(), client_ip).await?;

    let app = req.into_application(screenshot.is_some())?;
    let Some(screenshot) = screenshot else {
        return Err(AppError::Internal("screenshot presence already checked".into()));
    };

    let verified = OtpService::new(&state.db, state.otp_ttl())
        .has_verified(app.roster.leader_email(), OtpPurpose::TeamRegistration)
        .await?;
    if !verified {
        return Err(AppError::Validation("Please verify your email first".into()));
    }

    let evidence = PaymentEvidence {
        transaction_id: app.transaction_id.clone(),
        screenshot_key: screenshot.object.key.as_str().to_string(),
        screenshot_url: state.object_url(&screenshot.object.key),
        screenshot_name: screenshot.original_name.clone(),
        screenshot_mime: screenshot.mime_type.clone(),
    };
    let team = TeamRegistry::new(&state.db).register(&app, evidence).await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamRegisteredResponse {
            success: true,
            message: "Team registered successfully!".into(),
            team_id: team.id,
            team_size: TEAM_SIZE,
            payment_status: team.payment_status,
        }),
    ))
}

async fn verify_captcha(
    state: &AppState,
    token: Option<&str>,
    client_ip: &str,
) -> Result<(), AppError> {
    if !state.captcha.required() {
        return Ok(());
    }
    let rejected = || AppError::Validation("Please complete the reCAPTCHA verification.".into());

    let token = non_blank(token).ok_or_else(rejected)?;
    let passed = state
        .captcha
        .verify(token, Some(client_ip))
        .await
        .map_err(|e| {
            warn!(error = %e, "CAPTCHA verification failed");
            AppError::ExternalService("Server error during reCAPTCHA verification".into())
        })?;
    if !passed {
        return Err(rejected());
    }
    Ok(())
}
