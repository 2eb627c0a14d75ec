use chrono::{DateTime, Duration, Utc};
use common::OtpPurpose;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::otp;
use crate::error::AppError;
use crate::mail::{MailError, Mailer, templates};

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("OTP delivery failed: {0}")]
    Delivery(#[from] MailError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::Delivery(e) => {
                warn!(error = %e, "OTP mail delivery failed");
                AppError::ExternalService("Failed to send email".into())
            }
            OtpError::Db(e) => e.into(),
        }
    }
}

/// An issued code whose mail was accepted for delivery.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub id: i32,
    pub expires_at: DateTime<Utc>,
}

/// Uniformly random 6-digit code without a leading zero.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

/// Issues and checks one-time codes for an email address and purpose.
///
/// A code is only valid while it is delivered, unused and unexpired. The
/// expiry comparison is always part of the query, so validity never depends
/// on the background sweeper having run.
pub struct OtpService<'a, C: ConnectionTrait> {
    conn: &'a C,
    ttl: Duration,
}

impl<'a, C: ConnectionTrait> OtpService<'a, C> {
    pub fn new(conn: &'a C, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    /// Persist a pending code, mail it, then mark it delivered.
    ///
    /// When the mail is not accepted the pending record is removed again and
    /// the caller gets `OtpError::Delivery`.
    pub async fn issue(
        &self,
        mailer: &dyn Mailer,
        email: &str,
        name: &str,
        purpose: OtpPurpose,
    ) -> Result<IssuedOtp, OtpError> {
        let now = Utc::now();
        let code = generate_code();
        let expires_at = now + self.ttl;

        let pending = otp::ActiveModel {
            email: Set(email.to_string()),
            code: Set(code.clone()),
            purpose: Set(purpose),
            delivered: Set(false),
            is_used: Set(false),
            expires_at: Set(expires_at),
            created_at: Set(now),
            used_at: Set(None),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        let message = templates::otp(email, name, &code, purpose, self.ttl.num_minutes());
        if let Err(e) = mailer.send(message).await {
            if let Err(db_err) = otp::Entity::delete_by_id(pending.id).exec(self.conn).await {
                warn!(otp_id = pending.id, error = %db_err, "Failed to remove undelivered OTP");
            }
            return Err(e.into());
        }

        otp::Entity::update_many()
            .col_expr(otp::Column::Delivered, Expr::value(true))
            .filter(otp::Column::Id.eq(pending.id))
            .exec(self.conn)
            .await?;

        info!(%email, %purpose, "OTP issued");

        Ok(IssuedOtp {
            id: pending.id,
            expires_at,
        })
    }

    /// Consume a code. Succeeds at most once per code: the check and the
    /// `is_used` write are a single conditional update.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = otp::Entity::update_many()
            .col_expr(otp::Column::IsUsed, Expr::value(true))
            .col_expr(otp::Column::UsedAt, Expr::value(Some(now)))
            .filter(otp::Column::Email.eq(email))
            .filter(otp::Column::Code.eq(code))
            .filter(otp::Column::Purpose.eq(purpose))
            .filter(otp::Column::Delivered.eq(true))
            .filter(otp::Column::IsUsed.eq(false))
            .filter(otp::Column::ExpiresAt.gt(now))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Find a matching unexpired code whether or not it was already consumed.
    pub async fn find_valid(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otp::Model>, DbErr> {
        otp::Entity::find()
            .filter(otp::Column::Email.eq(email))
            .filter(otp::Column::Code.eq(code))
            .filter(otp::Column::Purpose.eq(purpose))
            .filter(otp::Column::Delivered.eq(true))
            .filter(otp::Column::ExpiresAt.gt(Utc::now()))
            .one(self.conn)
            .await
    }

    /// Mark a code used unless it already is.
    pub async fn consume_if_unused(&self, id: i32) -> Result<(), DbErr> {
        otp::Entity::update_many()
            .col_expr(otp::Column::IsUsed, Expr::value(true))
            .col_expr(otp::Column::UsedAt, Expr::value(Some(Utc::now())))
            .filter(otp::Column::Id.eq(id))
            .filter(otp::Column::IsUsed.eq(false))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Whether the address holds a consumed code for `purpose` that has not
    /// yet expired.
    pub async fn has_verified(&self, email: &str, purpose: OtpPurpose) -> Result<bool, DbErr> {
        let count = otp::Entity::find()
            .filter(otp::Column::Email.eq(email))
            .filter(otp::Column::Purpose.eq(purpose))
            .filter(otp::Column::IsUsed.eq(true))
            .filter(otp::Column::ExpiresAt.gt(Utc::now()))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}

/// Remove every expired record. Returns the number deleted.
pub async fn purge_expired<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let result = otp::Entity::delete_many()
        .filter(otp::Column::ExpiresAt.lte(Utc::now()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
