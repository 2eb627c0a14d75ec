use chrono::{DateTime, Utc};
use common::AdminRole;
use serde::{Deserialize, Serialize};

use crate::entity::admin::{self, Permission};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@portal.local")]
    pub email: Option<String>,
    #[schema(example = "changeme")]
    pub password: Option<String>,
}

/// Admin account as exposed to the dashboard. Never carries the password hash.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub permissions: Vec<Permission>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&admin::Model> for AdminProfile {
    fn from(m: &admin::Model) -> Self {
        Self {
            id: m.id,
            email: m.email.clone(),
            name: m.name.clone(),
            role: m.role,
            permissions: m.permissions(),
            last_login: m.last_login,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    #[schema(example = "Login successful")]
    pub message: String,
    /// Same value as the session cookie, for clients that send a bearer token.
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub success: bool,
    pub admin: AdminProfile,
}
