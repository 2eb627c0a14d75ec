use std::collections::HashSet;

use common::PaymentStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::non_blank;
use crate::utils::email::{is_valid_email, normalize_email};

/// Leader plus five members. Every registered team has exactly this many.
pub const TEAM_SIZE: usize = 6;

/// One step of the registration workflow, selected by the `action` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RegistrationAction {
    /// Mail a team-registration code to the prospective leader.
    SendOtp(SendOtpRequest),
    /// Consume the code, marking the leader's email verified.
    VerifyOtp(VerifyOtpRequest),
    /// Create the team. Multipart only, since it carries the payment screenshot.
    RegisterTeam(Box<RegisterTeamRequest>),
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendOtpRequest {
    #[schema(example = "lead@college.edu")]
    pub email: Option<String>,
    /// Used to greet the recipient.
    #[schema(example = "Asha Rao")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "lead@college.edu")]
    pub email: Option<String>,
    #[schema(example = "482913")]
    pub otp: Option<String>,
}

/// Flat registration form: leader fields plus `member{2..6}{Name,Enrollment,Email}`.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeamRequest {
    #[schema(example = "Orbit")]
    pub team_name: Option<String>,
    #[schema(example = "PS-07")]
    pub ps_number: Option<String>,
    pub problem_statement: Option<String>,
    pub leader_name: Option<String>,
    pub leader_enrollment: Option<String>,
    pub leader_email: Option<String>,
    pub member2_name: Option<String>,
    pub member2_enrollment: Option<String>,
    pub member2_email: Option<String>,
    pub member3_name: Option<String>,
    pub member3_enrollment: Option<String>,
    pub member3_email: Option<String>,
    pub member4_name: Option<String>,
    pub member4_enrollment: Option<String>,
    pub member4_email: Option<String>,
    pub member5_name: Option<String>,
    pub member5_enrollment: Option<String>,
    pub member5_email: Option<String>,
    pub member6_name: Option<String>,
    pub member6_enrollment: Option<String>,
    pub member6_email: Option<String>,
    #[schema(example = "TXN1")]
    pub transaction_id: Option<String>,
    #[serde(alias = "g-recaptcha-response")]
    pub recaptcha_token: Option<String>,
}

/// A team member as submitted. Emails are normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub enrollment: String,
    pub email: Option<String>,
}

/// The fixed-size roster of a team: a leader with a verified email and
/// exactly five further members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoster {
    leader: Participant,
    leader_email: String,
    members: [Participant; TEAM_SIZE - 1],
}

impl TeamRoster {
    pub fn new(
        leader_name: String,
        leader_enrollment: String,
        leader_email: String,
        members: [Participant; TEAM_SIZE - 1],
    ) -> Self {
        Self {
            leader: Participant {
                name: leader_name,
                enrollment: leader_enrollment,
                email: Some(leader_email.clone()),
            },
            leader_email,
            members,
        }
    }

    pub fn leader(&self) -> &Participant {
        &self.leader
    }

    pub fn leader_email(&self) -> &str {
        &self.leader_email
    }

    /// All participants with their slot number; the leader is slot 1.
    pub fn slots(&self) -> impl Iterator<Item = (i16, &Participant)> {
        std::iter::once(&self.leader)
            .chain(self.members.iter())
            .zip(1i16..)
            .map(|(p, slot)| (slot, p))
    }

    /// Provided emails in slot order.
    pub fn emails(&self) -> Vec<&str> {
        self.slots().filter_map(|(_, p)| p.email.as_deref()).collect()
    }

    pub fn enrollments(&self) -> Vec<&str> {
        self.slots().map(|(_, p)| p.enrollment.as_str()).collect()
    }

    pub fn has_duplicate_emails(&self) -> bool {
        has_duplicates(&self.emails())
    }

    pub fn has_duplicate_enrollments(&self) -> bool {
        has_duplicates(&self.enrollments())
    }
}

fn has_duplicates(values: &[&str]) -> bool {
    let mut seen = HashSet::new();
    values.iter().any(|v| !seen.insert(*v))
}

/// A structurally valid registration, ready for the uniqueness checks.
#[derive(Debug, Clone)]
pub struct TeamApplication {
    pub team_name: String,
    pub ps_number: String,
    pub problem_statement: String,
    pub roster: TeamRoster,
    pub transaction_id: String,
}

impl RegisterTeamRequest {
    /// Check presence and format of every field, in the order the form is
    /// reported on: leader details, transaction id, screenshot, members,
    /// then email formats.
    pub fn into_application(self, has_screenshot: bool) -> Result<TeamApplication, AppError> {
        let (Some(team_name), Some(ps_number), Some(problem_statement)) = (
            non_blank(self.team_name.as_deref()),
            non_blank(self.ps_number.as_deref()),
            non_blank(self.problem_statement.as_deref()),
        ) else {
            return Err(leader_details_required());
        };
        let (Some(leader_name), Some(leader_enrollment), Some(leader_email)) = (
            non_blank(self.leader_name.as_deref()),
            non_blank(self.leader_enrollment.as_deref()),
            non_blank(self.leader_email.as_deref()),
        ) else {
            return Err(leader_details_required());
        };

        let transaction_id = non_blank(self.transaction_id.as_deref()).ok_or_else(|| {
            AppError::Validation("Transaction ID is required for payment verification".into())
        })?;

        if !has_screenshot {
            return Err(AppError::Validation(
                "Payment screenshot is required for payment verification".into(),
            ));
        }

        let slots = [
            (&self.member2_name, &self.member2_enrollment, &self.member2_email),
            (&self.member3_name, &self.member3_enrollment, &self.member3_email),
            (&self.member4_name, &self.member4_enrollment, &self.member4_email),
            (&self.member5_name, &self.member5_enrollment, &self.member5_email),
            (&self.member6_name, &self.member6_enrollment, &self.member6_email),
        ];
        let mut members = Vec::with_capacity(TEAM_SIZE - 1);
        for (name, enrollment, email) in slots {
            let (Some(name), Some(enrollment)) =
                (non_blank(name.as_deref()), non_blank(enrollment.as_deref()))
            else {
                return Err(AppError::Validation(
                    "All 6 team members are required (Leader + 5 additional members). Please fill all member details.".into(),
                ));
            };
            members.push(Participant {
                name: name.to_string(),
                enrollment: enrollment.to_string(),
                email: non_blank(email.as_deref()).map(normalize_email),
            });
        }
        let members: [Participant; TEAM_SIZE - 1] = members
            .try_into()
            .map_err(|_| AppError::Internal("member slot count mismatch".into()))?;

        let roster = TeamRoster::new(
            leader_name.to_string(),
            leader_enrollment.to_string(),
            normalize_email(leader_email),
            members,
        );

        let invalid: Vec<String> = roster
            .slots()
            .filter_map(|(slot, p)| {
                let email = p.email.as_deref()?;
                (!is_valid_email(email)).then(|| {
                    if slot == 1 {
                        format!("Leader email '{email}' is not a valid email address")
                    } else {
                        format!("Member {slot} email '{email}' is not a valid email address")
                    }
                })
            })
            .collect();
        if !invalid.is_empty() {
            return Err(AppError::InvalidFields(invalid));
        }

        Ok(TeamApplication {
            team_name: team_name.to_string(),
            ps_number: ps_number.to_string(),
            problem_statement: problem_statement.to_string(),
            roster,
            transaction_id: transaction_id.to_string(),
        })
    }
}

fn leader_details_required() -> AppError {
    AppError::Validation("All team leader details are required".into())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentResponse {
    pub success: bool,
    #[schema(example = "OTP sent to lead@college.edu")]
    pub message: String,
    #[schema(example = "10 minutes")]
    pub expires_in: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamRegisteredResponse {
    pub success: bool,
    #[schema(example = "Team registered successfully!")]
    pub message: String,
    pub team_id: Uuid,
    #[schema(example = 6)]
    pub team_size: usize,
    pub payment_status: PaymentStatus,
}
