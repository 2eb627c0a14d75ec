use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use common::OtpPurpose;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::client::{ClientIp, UserAgent};
use crate::extractors::json::AppJson;
use crate::models::shared::non_blank;
use crate::models::team::EmailRequest;
use crate::models::upload::{
    PaymentDetails, PaymentUploadResponse, PptStatusResponse, PptSubmittedResponse,
    SubmissionDetail, SubmissionState,
};
use crate::otp::OtpService;
use crate::registry::{
    NewSubmission, PaymentEvidence, SubmissionOutcome, SubmissionRegistry, TeamRegistry,
};
use crate::state::AppState;
use crate::utils::email::normalize_email;
use crate::utils::upload::{self, UploadForm};

/// Multipart field carrying the presentation file.
pub const PRESENTATION_FIELD: &str = "pptFile";

pub fn upload_body_limit(max_file_bytes: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_file_bytes as usize + 64 * 1024)
}

#[utoipa::path(
    post,
    path = "/check-ppt-status",
    tag = "Uploads",
    operation_id = "checkPptStatus",
    summary = "Presentation status of a team",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "`not_submitted` or `already_submitted`", body = PptStatusResponse),
        (status = 400, description = "Email missing (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No team led by this email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn check_ppt_status(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<PptStatusResponse>, AppError> {
    let email = non_blank(payload.email.as_deref())
        .map(normalize_email)
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let team = TeamRegistry::new(&state.db)
        .find_by_leader_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;

    let response = match SubmissionRegistry::new(&state.db)
        .latest_for_team(team.id)
        .await?
    {
        Some(existing) => PptStatusResponse::already_submitted(&existing),
        None => PptStatusResponse::not_submitted(team.team_name, team.payment_status),
    };
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/ppt-submission-verified",
    tag = "Uploads",
    operation_id = "submitPpt",
    summary = "Submit a presentation with a verified code",
    description = "Multipart form with `pptFile`, `email` and `otp`. The file must be a \
        .ppt, .pptx or .pdf with a matching content type; it is checked before anything is \
        stored, and a rejected request leaves the code unconsumed. The code may already have \
        been verified but must not be expired. A team that already submitted gets its \
        existing submission back with `status: already_submitted`.",
    request_body(content_type = "multipart/form-data", description = "pptFile, email, otp"),
    responses(
        (status = 200, description = "Team already submitted", body = PptSubmittedResponse),
        (status = 201, description = "Submission stored", body = PptSubmittedResponse),
        (status = 400, description = "Bad file, missing fields or bad code (VALIDATION_ERROR, OTP_INVALID)", body = ErrorBody),
        (status = 404, description = "No team led by this email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, user_agent, multipart), fields(client = %client_ip))]
pub async fn submit_ppt(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = upload::read_form(
        multipart,
        PRESENTATION_FIELD,
        &upload::PRESENTATION,
        &*state.store,
        state.config.upload.max_presentation_bytes,
    )
    .await?;

    let result = store_submission(&state, &form, client_ip, user_agent).await;
    let keep_file = matches!(result, Ok((StatusCode::CREATED, _)));
    if !keep_file && let Some(file) = &form.file {
        file.discard(&*state.store).await;
    }

    let (status, body) = result?;
    Ok((status, Json(body)).into_response())
}

async fn store_submission(
    state: &AppState,
    form: &UploadForm,
    client_ip: String,
    user_agent: Option<String>,
) -> Result<(StatusCode, PptSubmittedResponse), AppError> {
    let (Some(email), Some(code)) = (form.text("email"), form.text("otp")) else {
        return Err(AppError::Validation("Email and OTP are required".into()));
    };
    let email = normalize_email(email);
    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::Validation(upload::PRESENTATION.missing.into()))?;

    let otps = OtpService::new(&state.db, state.otp_ttl());
    let otp = otps
        .find_valid(&email, code, OtpPurpose::PptSubmission)
        .await?
        .ok_or(AppError::OtpInvalid)?;

    let team = TeamRegistry::new(&state.db)
        .find_by_leader_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;

    let submissions = SubmissionRegistry::new(&state.db);
    if let Some(existing) = submissions.latest_for_team(team.id).await? {
        return Ok((StatusCode::OK, already_submitted(&existing)));
    }

    otps.consume_if_unused(otp.id).await?;

    let outcome = submissions
        .submit(NewSubmission {
            team: &team,
            leader_email: &email,
            file,
            file_url: state.object_url(&file.object.key),
            window_days: state.config.event.submission_window_days,
            ip_address: Some(client_ip),
            user_agent,
        })
        .await?;

    match outcome {
        SubmissionOutcome::Created(created) => {
            let message = if created.is_late {
                "PPT submitted successfully (Late submission)!"
            } else {
                "PPT submitted successfully!"
            };
            Ok((
                StatusCode::CREATED,
                PptSubmittedResponse {
                    success: true,
                    message: message.into(),
                    status: None,
                    submission: SubmissionDetail::from(&created),
                },
            ))
        }
        SubmissionOutcome::AlreadySubmitted(existing) => {
            Ok((StatusCode::OK, already_submitted(&existing)))
        }
    }
}

fn already_submitted(existing: &crate::entity::ppt_submission::Model) -> PptSubmittedResponse {
    PptSubmittedResponse {
        success: true,
        message: "PPT already submitted for this team".into(),
        status: Some(SubmissionState::AlreadySubmitted),
        submission: SubmissionDetail::from(existing),
    }
}

#[utoipa::path(
    post,
    path = "/payment-screenshot",
    tag = "Uploads",
    operation_id = "uploadPaymentScreenshot",
    summary = "Replace a team's payment evidence",
    description = "Multipart form with `teamId`, optional `transactionId` and optional \
        `paymentScreenshot` (JPEG or PNG). Marks the team `paid` and removes the previous \
        screenshot when a new one is stored.",
    request_body(content_type = "multipart/form-data", description = "teamId, transactionId, paymentScreenshot"),
    responses(
        (status = 200, description = "Payment details stored", body = PaymentUploadResponse),
        (status = 400, description = "Bad file or missing team id (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_payment_screenshot(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PaymentUploadResponse>, AppError> {
    let form = upload::read_form(
        multipart,
        crate::extractors::registration::SCREENSHOT_FIELD,
        &upload::SCREENSHOT,
        &*state.store,
        state.config.upload.max_screenshot_bytes,
    )
    .await?;

    let result = replace_evidence(&state, &form).await;
    if result.is_err()
        && let Some(file) = &form.file
    {
        file.discard(&*state.store).await;
    }
    Ok(Json(result?))
}

async fn replace_evidence(
    state: &AppState,
    form: &UploadForm,
) -> Result<PaymentUploadResponse, AppError> {
    let team_id = form
        .text("teamId")
        .ok_or_else(|| AppError::Validation("Team ID is required".into()))?;
    let team_id = Uuid::parse_str(team_id)
        .map_err(|_| AppError::NotFound("Team not found".into()))?;
    let transaction_id = form.text("transactionId").map(str::to_string);

    let evidence = form.file.as_ref().map(|file| PaymentEvidence {
        transaction_id: transaction_id.clone().unwrap_or_default(),
        screenshot_key: file.object.key.as_str().to_string(),
        screenshot_url: state.object_url(&file.object.key),
        screenshot_name: file.original_name.clone(),
        screenshot_mime: file.mime_type.clone(),
    });

    let (team, replaced) = TeamRegistry::new(&state.db)
        .replace_payment_evidence(team_id, transaction_id, evidence)
        .await?;

    if let Some(old_key) = replaced {
        remove_object(state, &old_key).await;
    }

    info!(team_id = %team.id, "Payment evidence updated");
    Ok(PaymentUploadResponse {
        success: true,
        message: "Payment details uploaded successfully! Your payment is under review.".into(),
        payment_details: PaymentDetails {
            status: team.payment_status,
            transaction_id: team.transaction_id,
            screenshot: form.file.as_ref().map(|f| f.original_name.clone()),
            upload_date: Utc::now(),
        },
    })
}

/// Best-effort delete of a stored object by its raw key.
pub(crate) async fn remove_object(state: &AppState, key: &str) {
    let parsed = match common::storage::ObjectKey::parse(key) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(%key, error = %e, "Stored object key is malformed");
            return;
        }
    };
    if let Err(e) = state.store.delete(&parsed).await {
        tracing::warn!(%key, error = %e, "Failed to delete stored object");
    }
}
