use chrono::{DateTime, Utc};
use common::{PaymentStatus, ReviewStatus};
use serde::Serialize;

use crate::entity::ppt_submission;
use crate::utils::upload::format_file_size;

/// Whether a team has handed in its presentation yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    NotSubmitted,
    AlreadySubmitted,
}

/// A presentation submission as shown to the submitting team.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    pub id: i32,
    pub team_name: String,
    pub leader_email: String,
    #[schema(example = "orbit-deck.pdf")]
    pub file_name: String,
    /// Human-readable size.
    #[schema(example = "1.5 MB")]
    pub file_size: String,
    pub submission_date: DateTime<Utc>,
    pub status: ReviewStatus,
    #[schema(example = 1)]
    pub version: i32,
    pub is_late_submission: bool,
}

impl From<&ppt_submission::Model> for SubmissionDetail {
    fn from(m: &ppt_submission::Model) -> Self {
        Self {
            id: m.id,
            team_name: m.team_name.clone(),
            leader_email: m.leader_email.clone(),
            file_name: m.original_name.clone(),
            file_size: format_file_size(m.file_size.max(0) as u64),
            submission_date: m.submitted_at,
            status: m.status,
            version: m.version,
            is_late_submission: m.is_late,
        }
    }
}

/// Submission state of a team, looked up by leader email.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PptStatusResponse {
    pub success: bool,
    pub message: String,
    pub status: SubmissionState,
    pub team_name: String,
    /// Present while nothing has been submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    /// Present once a submission exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionDetail>,
}

impl PptStatusResponse {
    pub fn not_submitted(team_name: String, payment_status: PaymentStatus) -> Self {
        Self {
            success: true,
            message: "No PPT submitted yet".into(),
            status: SubmissionState::NotSubmitted,
            team_name,
            payment_status: Some(payment_status),
            submission: None,
        }
    }

    pub fn already_submitted(submission: &ppt_submission::Model) -> Self {
        Self {
            success: true,
            message: "PPT already submitted".into(),
            status: SubmissionState::AlreadySubmitted,
            team_name: submission.team_name.clone(),
            payment_status: None,
            submission: Some(submission.into()),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PptSubmittedResponse {
    pub success: bool,
    #[schema(example = "PPT submitted successfully!")]
    pub message: String,
    /// Set to `already_submitted` when an earlier submission was returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionState>,
    pub submission: SubmissionDetail,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub status: PaymentStatus,
    pub transaction_id: String,
    /// Original name of the uploaded screenshot, when one was sent.
    pub screenshot: Option<String>,
    pub upload_date: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUploadResponse {
    pub success: bool,
    pub message: String,
    pub payment_details: PaymentDetails,
}
