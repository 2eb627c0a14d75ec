use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{PaymentStatus, ReviewStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{ppt_submission, team, team_member};
use crate::error::AppError;
use crate::models::shared::Pagination;
use crate::utils::upload::format_file_size;

pub const MAX_REVIEW_COMMENT_CHARS: usize = 1000;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub name: String,
    /// Empty when the member gave no email.
    pub email: String,
    pub enrollment: String,
    /// `Leader` for slot 1, `Member N` otherwise.
    #[schema(example = "Member 2")]
    pub role: String,
}

impl From<&team_member::Model> for MemberView {
    fn from(m: &team_member::Model) -> Self {
        Self {
            name: m.name.clone(),
            email: m.email.clone().unwrap_or_default(),
            enrollment: m.enrollment.clone(),
            role: if m.is_leader() {
                "Leader".into()
            } else {
                format!("Member {}", m.slot)
            },
        }
    }
}

/// A team with its ordered roster.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: Uuid,
    pub team_name: String,
    pub ps_number: String,
    pub problem_statement: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_enrollment: String,
    pub members: Vec<MemberView>,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub screenshot_name: String,
    pub screenshot_url: String,
    pub has_submission: bool,
    pub registration_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamView {
    /// `members` must be ordered by slot.
    pub fn new(team: &team::Model, members: &[team_member::Model], has_submission: bool) -> Self {
        let leader = members.iter().find(|m| m.is_leader());
        Self {
            id: team.id,
            team_name: team.team_name.clone(),
            ps_number: team.ps_number.clone(),
            problem_statement: team.problem_statement.clone(),
            leader_name: leader.map(|l| l.name.clone()).unwrap_or_default(),
            leader_email: leader.and_then(|l| l.email.clone()).unwrap_or_default(),
            leader_enrollment: leader.map(|l| l.enrollment.clone()).unwrap_or_default(),
            members: members.iter().map(MemberView::from).collect(),
            payment_status: team.payment_status,
            transaction_id: team.transaction_id.clone(),
            screenshot_name: team.screenshot_name.clone(),
            screenshot_url: team.screenshot_url.clone(),
            has_submission,
            registration_date: team.registered_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_teams: u64,
    pub total_submissions: u64,
    /// Teams without a submission.
    pub pending_submissions: u64,
    pub paid_teams: u64,
    pub verified_teams: u64,
    pub pending_teams: u64,
    pub rejected_teams: u64,
    /// Paid or verified teams times the registration fee.
    pub total_revenue: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub success: bool,
    pub teams: Vec<TeamView>,
    pub stats: DashboardStats,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub success: bool,
    pub team: TeamView,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamUpdatedResponse {
    pub success: bool,
    #[schema(example = "Payment status updated successfully")]
    pub message: String,
    pub team: TeamView,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMailRequest {
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionSortField {
    #[default]
    SubmittedAt,
    TeamName,
    Status,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u64>,
    /// Items per page, 1-100 (default 10).
    pub limit: Option<u64>,
    pub status: Option<ReviewStatus>,
    /// Matches team name or leader email, case-insensitively.
    pub search: Option<String>,
    #[param(inline)]
    pub sort_by: Option<SubmissionSortField>,
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

/// A submission with its review state, as listed to staff.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i32,
    pub team_id: Uuid,
    pub team_name: String,
    pub leader_email: String,
    pub file_name: String,
    pub file_size: i64,
    #[schema(example = "1.5 MB")]
    pub file_size_label: String,
    pub mime_type: String,
    pub checksum: String,
    pub submission_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub is_late_submission: bool,
    pub version: i32,
    pub status: ReviewStatus,
    pub review_comments: Option<String>,
    pub reviewed_by: Option<i32>,
    pub review_date: Option<DateTime<Utc>>,
    pub score: Option<i32>,
}

impl From<ppt_submission::Model> for ReviewView {
    fn from(m: ppt_submission::Model) -> Self {
        Self {
            id: m.id,
            team_id: m.team_id,
            team_name: m.team_name,
            leader_email: m.leader_email,
            file_size_label: format_file_size(m.file_size.max(0) as u64),
            file_name: m.original_name,
            file_size: m.file_size,
            mime_type: m.mime_type,
            checksum: m.checksum,
            submission_date: m.submitted_at,
            deadline: m.deadline,
            is_late_submission: m.is_late,
            version: m.version,
            status: m.status,
            review_comments: m.review_comments,
            reviewed_by: m.reviewed_by,
            review_date: m.review_date,
            score: m.score,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub submissions: Vec<ReviewView>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReviewRequest {
    pub status: ReviewStatus,
    pub comments: Option<String>,
    #[schema(minimum = 0, maximum = 100)]
    pub score: Option<i32>,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(comments) = &self.comments
            && comments.chars().count() > MAX_REVIEW_COMMENT_CHARS
        {
            return Err(AppError::Validation(
                "Review comments cannot exceed 1000 characters".into(),
            ));
        }
        if let Some(score) = self.score
            && !(0..=100).contains(&score)
        {
            return Err(AppError::Validation(
                "Score must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub success: bool,
    #[schema(example = "PPT review updated successfully")]
    pub message: String,
    pub submission: ReviewView,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    pub total: u64,
    pub late: u64,
    /// Count per review status; every status is present.
    pub by_status: BTreeMap<String, u64>,
    /// Mean over scored submissions, `null` when none are scored.
    pub average_score: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBucket {
    pub status: PaymentStatus,
    pub count: u64,
    /// `count` times the registration fee.
    pub total_amount: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub success: bool,
    pub ppt_submissions: SubmissionStats,
    pub payments: Vec<PaymentBucket>,
}
