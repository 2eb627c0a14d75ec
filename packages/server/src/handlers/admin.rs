use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use common::PaymentStatus;
use common::storage::ObjectKey;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entity::admin::Permission;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::handlers::upload::remove_object;
use crate::mail::templates;
use crate::models::admin::{
    DashboardResponse, DashboardStats, PaymentBucket, PaymentStatusUpdate, ReviewRequest,
    ReviewResponse, ReviewView, StatsResponse, SubmissionListQuery, SubmissionListResponse,
    SubmissionStats, TeamResponse, TeamUpdatedResponse, TeamView, VerificationMailRequest,
};
use crate::models::shared::{MessageResponse, Pagination, resolve_paging};
use crate::registry::{SubmissionRegistry, TeamRegistry};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

async fn team_view(state: &AppState, team: &crate::entity::team::Model) -> Result<TeamView, AppError> {
    let roster = TeamRegistry::new(&state.db).roster(team.id).await?;
    let has_submission = SubmissionRegistry::new(&state.db)
        .latest_for_team(team.id)
        .await?
        .is_some();
    Ok(TeamView::new(team, &roster, has_submission))
}

fn stored_key(raw: &str) -> Result<ObjectKey, AppError> {
    ObjectKey::parse(raw).map_err(|_| AppError::NotFound("File not found".into()))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Admin",
    operation_id = "adminDashboard",
    summary = "All teams with summary counts",
    description = "Teams are ordered newest registration first. Revenue counts `paid` and \
        `verified` teams at the configured registration fee. Requires `canViewTeams`.",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn dashboard(
    session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    session.require(Permission::ViewTeams)?;

    let teams = TeamRegistry::new(&state.db).list_with_rosters().await?;
    let submitted = SubmissionRegistry::new(&state.db)
        .submitted_team_ids()
        .await?;

    let mut stats = DashboardStats {
        total_teams: teams.len() as u64,
        ..Default::default()
    };
    let views: Vec<TeamView> = teams
        .iter()
        .map(|(team, roster)| {
            let has_submission = submitted.contains(&team.id);
            if has_submission {
                stats.total_submissions += 1;
            }
            match team.payment_status {
                PaymentStatus::Pending => stats.pending_teams += 1,
                PaymentStatus::Paid => stats.paid_teams += 1,
                PaymentStatus::Verified => stats.verified_teams += 1,
                PaymentStatus::Rejected => stats.rejected_teams += 1,
            }
            TeamView::new(team, roster, has_submission)
        })
        .collect();

    stats.pending_submissions = stats.total_teams - stats.total_submissions;
    stats.total_revenue =
        (stats.paid_teams + stats.verified_teams) as i64 * state.config.event.registration_fee;

    Ok(Json(DashboardResponse {
        success: true,
        teams: views,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "Admin",
    operation_id = "adminGetTeam",
    summary = "One team with its roster",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team", body = TeamResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn get_team(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamResponse>, AppError> {
    session.require(Permission::ViewTeams)?;

    let team = TeamRegistry::new(&state.db).find(id).await?;
    Ok(Json(TeamResponse {
        success: true,
        team: team_view(&state, &team).await?,
    }))
}

#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "Admin",
    operation_id = "adminDeleteTeam",
    summary = "Delete a team",
    description = "Removes the team, its roster and its submissions, then deletes the stored \
        files. Requires `canDeleteTeams`.",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team deleted", body = MessageResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn delete_team(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    session.require(Permission::DeleteTeams)?;

    let keys = TeamRegistry::new(&state.db).delete(id).await?;
    for key in keys.iter().filter(|k| !k.is_empty()) {
        remove_object(&state, key).await;
    }

    Ok(Json(MessageResponse::ok("Team deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/teams/{id}/ppt",
    tag = "Admin",
    operation_id = "adminDownloadPpt",
    summary = "Download a team's presentation",
    description = "Streams the latest submitted file as an attachment under its original name.",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No submission or file missing (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn download_ppt(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    session.require(Permission::ViewTeams)?;

    let submission = SubmissionRegistry::new(&state.db)
        .latest_for_team(id)
        .await?
        .ok_or_else(|| AppError::NotFound("PPT submission not found".into()))?;

    let key = stored_key(&submission.file_key)?;
    let reader = state.store.get_stream(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &submission.mime_type)
        .header(header::CONTENT_LENGTH, submission.file_size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&submission.original_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    get,
    path = "/teams/{id}/screenshot",
    tag = "Admin",
    operation_id = "adminGetScreenshot",
    summary = "View a team's payment screenshot",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Image content", content_type = "image/*"),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn get_screenshot(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    session.require(Permission::ViewTeams)?;

    let team = TeamRegistry::new(&state.db).find(id).await?;
    if team.screenshot_key.is_empty() {
        return Err(AppError::NotFound("Payment screenshot not found".into()));
    }
    let key = stored_key(&team.screenshot_key)?;
    let reader = state.store.get_stream(&key).await?;

    let content_type = if team.screenshot_mime.is_empty() {
        mime_guess::from_path(&team.screenshot_name)
            .first_or_octet_stream()
            .to_string()
    } else {
        team.screenshot_mime.clone()
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    patch,
    path = "/teams/{id}/payment-status",
    tag = "Admin",
    operation_id = "adminUpdatePaymentStatus",
    summary = "Set a team's payment status",
    description = "Any status may be set from any other. Requires `canManagePayments`.",
    params(("id" = Uuid, Path, description = "Team ID")),
    request_body = PaymentStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = TeamUpdatedResponse),
        (status = 400, description = "Unknown status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, payload), fields(admin_id = session.id()))]
pub async fn update_payment_status(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<PaymentStatusUpdate>,
) -> Result<Json<TeamUpdatedResponse>, AppError> {
    session.require(Permission::ManagePayments)?;

    let team = TeamRegistry::new(&state.db)
        .set_payment_status(id, payload.status)
        .await?;
    info!(team_id = %team.id, status = %team.payment_status, "Payment status changed");

    Ok(Json(TeamUpdatedResponse {
        success: true,
        message: "Payment status updated successfully".into(),
        team: team_view(&state, &team).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/send-verification-mail",
    tag = "Admin",
    operation_id = "adminSendVerificationMail",
    summary = "Email a team leader that the team is verified",
    description = "Requires `canSendEmails`. The payment status is not changed.",
    request_body = VerificationMailRequest,
    responses(
        (status = 200, description = "Mail sent", body = MessageResponse),
        (status = 400, description = "Team id missing (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Mail provider failed (EXTERNAL_SERVICE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, payload), fields(admin_id = session.id()))]
pub async fn send_verification_mail(
    session: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerificationMailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    session.require(Permission::SendEmails)?;

    let team_id = payload
        .team_id
        .ok_or_else(|| AppError::Validation("Team ID is required".into()))?;
    let teams = TeamRegistry::new(&state.db);
    let team = teams.find(team_id).await?;
    let leader = teams.leader(team.id).await?;
    let Some(to) = leader.email.as_deref() else {
        return Err(AppError::Internal(format!("leader of team {team_id} has no email")));
    };

    let message = templates::team_verified(to, &leader.name, &team.team_name);
    state.mailer.send(message).await.map_err(|e| {
        warn!(team_id = %team.id, error = %e, "Verification mail failed");
        AppError::ExternalService("Failed to send verification email".into())
    })?;

    info!(team_id = %team.id, "Verification mail sent");
    Ok(Json(MessageResponse::ok(format!(
        "Verification email sent successfully to {}",
        team.team_name
    ))))
}

#[utoipa::path(
    get,
    path = "/ppt-submissions",
    tag = "Admin",
    operation_id = "adminListSubmissions",
    summary = "List presentation submissions",
    params(SubmissionListQuery),
    responses(
        (status = 200, description = "One page of submissions", body = SubmissionListResponse),
        (status = 400, description = "Bad paging or filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn list_submissions(
    session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    session.require(Permission::ViewTeams)?;

    let (page, per_page) = resolve_paging(query.page, query.limit)?;
    let (rows, total) = SubmissionRegistry::new(&state.db)
        .list(&query, page, per_page)
        .await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        submissions: rows.into_iter().map(ReviewView::from).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    put,
    path = "/ppt-submissions/{id}/review",
    tag = "Admin",
    operation_id = "adminReviewSubmission",
    summary = "Record a review of a submission",
    description = "Sets status, comments and score, and stamps the reviewer and review time. \
        Comments are limited to 1000 characters and scores to 0-100. Requires `canEditTeams`.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Out-of-range input (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, payload), fields(admin_id = session.id()))]
pub async fn review_submission(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    session.require(Permission::EditTeams)?;

    let updated = SubmissionRegistry::new(&state.db)
        .review(id, payload, session.id())
        .await?;

    Ok(Json(ReviewResponse {
        success: true,
        message: "PPT review updated successfully".into(),
        submission: ReviewView::from(updated),
    }))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "adminStats",
    summary = "Submission and payment aggregates",
    responses(
        (status = 200, description = "Aggregates", body = StatsResponse),
        (status = 401, description = "Not logged in (TOKEN_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing permission (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state), fields(admin_id = session.id()))]
pub async fn stats(
    session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    session.require(Permission::AccessReports)?;

    let submissions = SubmissionRegistry::new(&state.db).stats().await?;
    let fee = state.config.event.registration_fee;
    let payments = TeamRegistry::new(&state.db)
        .payment_counts()
        .await?
        .into_iter()
        .map(|(status, count)| PaymentBucket {
            status,
            count,
            total_amount: count as i64 * fee,
        })
        .collect();

    Ok(Json(StatsResponse {
        success: true,
        ppt_submissions: SubmissionStats {
            total: submissions.total,
            late: submissions.late,
            by_status: submissions
                .by_status
                .into_iter()
                .map(|(status, n)| (status.as_str().to_string(), n))
                .collect(),
            average_score: submissions.average_score,
        },
        payments,
    }))
}
