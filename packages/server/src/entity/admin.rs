use chrono::{DateTime, Utc};
use common::AdminRole;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub name: String,
    pub role: AdminRole,
    pub is_active: bool,

    pub can_view_teams: bool,
    pub can_edit_teams: bool,
    pub can_delete_teams: bool,
    pub can_send_emails: bool,
    pub can_manage_payments: bool,
    pub can_access_reports: bool,

    pub last_login: Option<DateTimeUtc>,
    /// Consecutive failed logins since the last success or lock expiry.
    pub login_attempts: i32,
    pub lock_until: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::ppt_submission::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        if self.role.bypasses_permissions() {
            return true;
        }
        match permission {
            Permission::ViewTeams => self.can_view_teams,
            Permission::EditTeams => self.can_edit_teams,
            Permission::DeleteTeams => self.can_delete_teams,
            Permission::SendEmails => self.can_send_emails,
            Permission::ManagePayments => self.can_manage_payments,
            Permission::AccessReports => self.can_access_reports,
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.has_permission(*p))
            .collect()
    }
}

/// Privileged capability checked by the admin endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum Permission {
    #[serde(rename = "canViewTeams")]
    ViewTeams,
    #[serde(rename = "canEditTeams")]
    EditTeams,
    #[serde(rename = "canDeleteTeams")]
    DeleteTeams,
    #[serde(rename = "canSendEmails")]
    SendEmails,
    #[serde(rename = "canManagePayments")]
    ManagePayments,
    #[serde(rename = "canAccessReports")]
    AccessReports,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Self::ViewTeams,
        Self::EditTeams,
        Self::DeleteTeams,
        Self::SendEmails,
        Self::ManagePayments,
        Self::AccessReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewTeams => "canViewTeams",
            Self::EditTeams => "canEditTeams",
            Self::DeleteTeams => "canDeleteTeams",
            Self::SendEmails => "canSendEmails",
            Self::ManagePayments => "canManagePayments",
            Self::AccessReports => "canAccessReports",
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
