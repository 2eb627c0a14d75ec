#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a one-time code proves control of the mailbox for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "team_registration"))]
    TeamRegistration,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ppt_submission"))]
    PptSubmission,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "password_reset"))]
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamRegistration => "team_registration",
            Self::PptSubmission => "ppt_submission",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Short description used in mail subjects.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::TeamRegistration => "Team Registration",
            Self::PptSubmission => "PPT Submission",
            Self::PasswordReset => "Password Reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
