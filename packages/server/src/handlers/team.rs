use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use common::OtpPurpose;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::registration::OtpSentResponse;
use crate::models::shared::non_blank;
use crate::models::team::{EmailCheckResponse, EmailRequest, PptOtpVerifiedResponse, PptOtpVerifyRequest};
use crate::models::upload::PptStatusResponse;
use crate::otp::OtpService;
use crate::registry::{SubmissionRegistry, TeamRegistry};
use crate::state::AppState;
use crate::utils::email::normalize_email;

fn required_email(req: &EmailRequest) -> Result<String, AppError> {
    non_blank(req.email.as_deref())
        .map(normalize_email)
        .ok_or_else(|| AppError::Validation("Email is required".into()))
}

#[utoipa::path(
    post,
    path = "/check-email-exists",
    tag = "Teams",
    operation_id = "checkEmailExists",
    summary = "Look up a team by leader email",
    description = "Only the leader email is matched; member emails are ignored. \
        A miss is reported with `success: false` and status 200.",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Lookup result", body = EmailCheckResponse),
        (status = 400, description = "Email missing (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn check_email_exists(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<EmailCheckResponse>, AppError> {
    let email = required_email(&payload)?;

    let response = match TeamRegistry::new(&state.db).find_by_leader_email(&email).await? {
        Some(team) => EmailCheckResponse::found(team.team_name),
        None => EmailCheckResponse::missing(),
    };
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/send-ppt-submission-otp",
    tag = "Teams",
    operation_id = "sendPptSubmissionOtp",
    summary = "Mail a presentation-submission code to a team leader",
    description = "If the team already submitted, no code is sent and the existing \
        submission is returned with `success: false` and `status: already_submitted`.",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent, or team already submitted", body = OtpSentResponse),
        (status = 400, description = "Email missing (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No team led by this email (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Mail delivery failed (EXTERNAL_SERVICE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn send_ppt_submission_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Response, AppError> {
    let email = required_email(&payload)?;

    let teams = TeamRegistry::new(&state.db);
    let team = teams
        .find_by_leader_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No team found with this email address".into()))?;

    if let Some(existing) = SubmissionRegistry::new(&state.db)
        .latest_for_team(team.id)
        .await?
    {
        let mut body = PptStatusResponse::already_submitted(&existing);
        body.success = false;
        body.message = "PPT already submitted for this team".into();
        return Ok(Json(body).into_response());
    }

    let leader = teams.leader(team.id).await?;
    OtpService::new(&state.db, state.otp_ttl())
        .issue(&*state.mailer, &email, &leader.name, OtpPurpose::PptSubmission)
        .await?;

    Ok(Json(OtpSentResponse {
        success: true,
        message: format!("OTP sent successfully to {email}"),
        expires_in: format!("{} minutes", state.config.otp.ttl_minutes),
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/verify-ppt-submission-otp",
    tag = "Teams",
    operation_id = "verifyPptSubmissionOtp",
    summary = "Verify a presentation-submission code",
    description = "Consumes the code. The upload endpoint still accepts the same code \
        until it expires.",
    request_body = PptOtpVerifyRequest,
    responses(
        (status = 200, description = "Code accepted", body = PptOtpVerifiedResponse),
        (status = 400, description = "Missing fields or bad code (VALIDATION_ERROR, OTP_INVALID)", body = ErrorBody),
        (status = 404, description = "No team led by this email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn verify_ppt_submission_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PptOtpVerifyRequest>,
) -> Result<Json<PptOtpVerifiedResponse>, AppError> {
    let (Some(email), Some(code)) = (
        non_blank(payload.email.as_deref()),
        non_blank(payload.otp.as_deref()),
    ) else {
        return Err(AppError::Validation("Email and OTP are required".into()));
    };
    let email = normalize_email(email);

    let verified = OtpService::new(&state.db, state.otp_ttl())
        .verify(&email, code, OtpPurpose::PptSubmission)
        .await?;
    if !verified {
        return Err(AppError::OtpInvalid);
    }

    let team = TeamRegistry::new(&state.db)
        .find_by_leader_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;

    info!(%email, team_id = %team.id, "Submission code verified");
    Ok(Json(PptOtpVerifiedResponse {
        success: true,
        message: "OTP verified successfully".into(),
        team_id: team.id,
        team_name: team.team_name,
    }))
}
