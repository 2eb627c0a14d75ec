use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct EmailRequest {
    #[schema(example = "lead@college.edu")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PptOtpVerifyRequest {
    #[schema(example = "lead@college.edu")]
    pub email: Option<String>,
    #[schema(example = "482913")]
    pub otp: Option<String>,
}

/// Result of a leader-email lookup. Member emails are not matched.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailCheckResponse {
    pub success: bool,
    pub user_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub message: String,
}

impl EmailCheckResponse {
    pub fn found(team_name: String) -> Self {
        Self {
            success: true,
            user_exists: true,
            message: format!("Team \"{team_name}\" found"),
            team_name: Some(team_name),
        }
    }

    pub fn missing() -> Self {
        Self {
            success: false,
            user_exists: false,
            team_name: None,
            message: "No team found with this email address. Please register first.".into(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PptOtpVerifiedResponse {
    pub success: bool,
    #[schema(example = "OTP verified successfully")]
    pub message: String,
    pub team_id: Uuid,
    pub team_name: String,
}
