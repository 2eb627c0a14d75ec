use chrono::Utc;
use common::AdminRole;
use sea_orm::*;
use sea_query::{Index, PostgresQueryBuilder};
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;
use crate::entity::{admin, otp, ppt_submission};
use crate::utils::email::normalize_email;
use crate::utils::hash::hash_password;

/// Create the super admin from configuration when none exists yet.
pub async fn ensure_super_admin(
    db: &DatabaseConnection,
    bootstrap: &AdminBootstrapConfig,
) -> Result<(), DbErr> {
    let existing = admin::Entity::find()
        .filter(admin::Column::Role.eq(AdminRole::SuperAdmin))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let (Some(email), Some(password)) = (&bootstrap.email, &bootstrap.password) else {
        warn!("No super admin exists and admin.email/admin.password are not configured");
        return Ok(());
    };

    let password_hash = hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Failed to hash bootstrap password: {e}")))?;
    let email = normalize_email(email);
    let now = Utc::now();

    let model = admin::ActiveModel {
        email: Set(email.clone()),
        password: Set(password_hash),
        name: Set(bootstrap.name.clone()),
        role: Set(AdminRole::SuperAdmin),
        is_active: Set(true),
        can_view_teams: Set(true),
        can_edit_teams: Set(true),
        can_delete_teams: Set(true),
        can_send_emails: Set(true),
        can_manage_payments: Set(true),
        can_access_reports: Set(true),
        last_login: Set(None),
        login_attempts: Set(0),
        lock_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = admin::Entity::insert(model)
        .on_conflict(
            sea_query::OnConflict::column(admin::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(%email, "Created super admin"),
        Err(DbErr::RecordNotInserted) => {
            warn!(%email, "Bootstrap admin email already belongs to another account")
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Ensure composite lookup indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // OTP lookups: WHERE email = ? AND purpose = ? AND is_used = ?
    let otp_lookup = Index::create()
        .if_not_exists()
        .name("idx_otp_email_purpose_used")
        .table(otp::Entity)
        .col(otp::Column::Email)
        .col(otp::Column::Purpose)
        .col(otp::Column::IsUsed)
        .to_string(PostgresQueryBuilder);

    // Review queue: filter by status, newest first
    let review_queue = Index::create()
        .if_not_exists()
        .name("idx_ppt_submission_status_submitted")
        .table(ppt_submission::Entity)
        .col(ppt_submission::Column::Status)
        .col(ppt_submission::Column::SubmittedAt)
        .to_string(PostgresQueryBuilder);

    for (name, stmt) in [
        ("idx_otp_email_purpose_used", otp_lookup),
        ("idx_ppt_submission_status_submitted", review_queue),
    ] {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
