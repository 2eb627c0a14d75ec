use std::collections::HashMap;

use chrono::Utc;
use common::PaymentStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{ppt_submission, team, team_member};
use crate::error::AppError;
use crate::models::registration::TeamApplication;

/// First uniqueness rule a registration breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamConflict {
    #[error("Email {email} is already registered with team \"{team_name}\"")]
    Email { email: String, team_name: String },
    #[error("Enrollment number {0} is already registered")]
    Enrollment(String),
    #[error("Team name \"{0}\" is already taken")]
    TeamName(String),
    #[error("Transaction ID {0} has already been used")]
    TransactionId(String),
}

impl From<TeamConflict> for AppError {
    fn from(conflict: TeamConflict) -> Self {
        AppError::Conflict(conflict.to_string())
    }
}

/// Stored payment screenshot plus the transaction id it proves.
#[derive(Debug, Clone)]
pub struct PaymentEvidence {
    pub transaction_id: String,
    pub screenshot_key: String,
    pub screenshot_url: String,
    pub screenshot_name: String,
    pub screenshot_mime: String,
}

/// Owns team records and their six-slot rosters.
///
/// Uniqueness of emails, enrollments, team names and transaction ids is
/// enforced by unique indexes. The pre-checks here only exist to name the
/// conflicting value; a unique violation on insert is the authoritative
/// signal.
pub struct TeamRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TeamRegistry<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: Uuid) -> Result<team::Model, AppError> {
        team::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".into()))
    }

    /// Team whose leader (slot 1) has this email. Members are not matched.
    pub async fn find_by_leader_email(&self, email: &str) -> Result<Option<team::Model>, DbErr> {
        let Some(leader) = team_member::Entity::find()
            .filter(team_member::Column::Email.eq(email))
            .filter(team_member::Column::Slot.eq(team_member::LEADER_SLOT))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };
        team::Entity::find_by_id(leader.team_id).one(self.conn).await
    }

    /// Roster member holding this email, in any team and slot.
    pub async fn member_by_email(&self, email: &str) -> Result<Option<team_member::Model>, DbErr> {
        team_member::Entity::find()
            .filter(team_member::Column::Email.eq(email))
            .one(self.conn)
            .await
    }

    /// Members of a team ordered by slot, leader first.
    pub async fn roster(&self, team_id: Uuid) -> Result<Vec<team_member::Model>, DbErr> {
        team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .order_by_asc(team_member::Column::Slot)
            .all(self.conn)
            .await
    }

    /// Every team, newest registration first, each with its ordered roster.
    pub async fn list_with_rosters(
        &self,
    ) -> Result<Vec<(team::Model, Vec<team_member::Model>)>, DbErr> {
        let teams = team::Entity::find()
            .order_by_desc(team::Column::RegisteredAt)
            .all(self.conn)
            .await?;
        let members = team_member::Entity::find()
            .order_by_asc(team_member::Column::Slot)
            .all(self.conn)
            .await?;

        let mut rosters: HashMap<Uuid, Vec<team_member::Model>> = HashMap::new();
        for member in members {
            rosters.entry(member.team_id).or_default().push(member);
        }
        Ok(teams
            .into_iter()
            .map(|t| {
                let roster = rosters.remove(&t.id).unwrap_or_default();
                (t, roster)
            })
            .collect())
    }

    pub async fn leader(&self, team_id: Uuid) -> Result<team_member::Model, AppError> {
        team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::Slot.eq(team_member::LEADER_SLOT))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal(format!("team {team_id} has no leader row")))
    }

    /// Run the uniqueness checks in reporting order: duplicate emails within
    /// the form, emails already registered, duplicate enrollments within the
    /// form, enrollments already registered, team name, transaction id.
    pub async fn check_uniqueness(&self, app: &TeamApplication) -> Result<(), AppError> {
        if app.roster.has_duplicate_emails() {
            return Err(AppError::Validation(
                "Duplicate email addresses found in team members".into(),
            ));
        }
        if let Some(conflict) = self.email_conflict(app).await? {
            return Err(conflict.into());
        }

        if app.roster.has_duplicate_enrollments() {
            return Err(AppError::Validation(
                "Duplicate enrollment numbers found in team".into(),
            ));
        }
        if let Some(conflict) = self.enrollment_conflict(app).await? {
            return Err(conflict.into());
        }

        let name_taken = team::Entity::find()
            .filter(team::Column::TeamNameKey.eq(team_name_key(&app.team_name)))
            .one(self.conn)
            .await?
            .is_some();
        if name_taken {
            return Err(TeamConflict::TeamName(app.team_name.clone()).into());
        }

        let txn_used = team::Entity::find()
            .filter(team::Column::TransactionId.eq(&app.transaction_id))
            .one(self.conn)
            .await?
            .is_some();
        if txn_used {
            return Err(TeamConflict::TransactionId(app.transaction_id.clone()).into());
        }

        Ok(())
    }

    async fn email_conflict(&self, app: &TeamApplication) -> Result<Option<TeamConflict>, DbErr> {
        let emails = app.roster.emails();
        let existing = team_member::Entity::find()
            .filter(team_member::Column::Email.is_in(emails.iter().copied()))
            .all(self.conn)
            .await?;

        let Some(hit) = emails.iter().find_map(|email| {
            existing
                .iter()
                .find(|m| m.email.as_deref() == Some(*email))
        }) else {
            return Ok(None);
        };

        let team_name = team::Entity::find_by_id(hit.team_id)
            .one(self.conn)
            .await?
            .map(|t| t.team_name)
            .unwrap_or_default();
        Ok(Some(TeamConflict::Email {
            email: hit.email.clone().unwrap_or_default(),
            team_name,
        }))
    }

    async fn enrollment_conflict(
        &self,
        app: &TeamApplication,
    ) -> Result<Option<TeamConflict>, DbErr> {
        let enrollments = app.roster.enrollments();
        let existing = team_member::Entity::find()
            .filter(team_member::Column::Enrollment.is_in(enrollments.iter().copied()))
            .all(self.conn)
            .await?;

        Ok(enrollments
            .iter()
            .find(|e| existing.iter().any(|m| m.enrollment == **e))
            .map(|e| TeamConflict::Enrollment(e.to_string())))
    }

    /// Team counts per payment status, every status present.
    pub async fn payment_counts(&self) -> Result<Vec<(PaymentStatus, u64)>, DbErr> {
        let grouped: Vec<(PaymentStatus, i64)> = team::Entity::find()
            .select_only()
            .column(team::Column::PaymentStatus)
            .column_as(team::Column::Id.count(), "count")
            .group_by(team::Column::PaymentStatus)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(PaymentStatus::ALL
            .iter()
            .map(|status| {
                let n = grouped
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, n)| *n as u64);
                (*status, n)
            })
            .collect())
    }

    pub async fn set_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<team::Model, AppError> {
        let existing = self.find(id).await?;
        let mut active: team::ActiveModel = existing.into();
        active.payment_status = Set(status);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.conn).await?)
    }

    /// Replace the stored payment proof and mark the team `paid`. Returns the
    /// updated team and the key of the screenshot that was replaced, if any.
    pub async fn replace_payment_evidence(
        &self,
        id: Uuid,
        transaction_id: Option<String>,
        screenshot: Option<PaymentEvidence>,
    ) -> Result<(team::Model, Option<String>), AppError> {
        let existing = self.find(id).await?;
        let previous_key = existing.screenshot_key.clone();

        let mut active: team::ActiveModel = existing.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.updated_at = Set(Utc::now());
        if let Some(txn) = &transaction_id {
            active.transaction_id = Set(txn.clone());
        }
        let replaced = screenshot.map(|s| {
            active.screenshot_key = Set(s.screenshot_key);
            active.screenshot_url = Set(s.screenshot_url);
            active.screenshot_name = Set(s.screenshot_name);
            active.screenshot_mime = Set(s.screenshot_mime);
            previous_key
        });

        let updated = active.update(self.conn).await.map_err(|e| {
            match (e.sql_err(), transaction_id) {
                (Some(SqlErr::UniqueConstraintViolation(_)), Some(txn)) => {
                    TeamConflict::TransactionId(txn).into()
                }
                _ => AppError::from(e),
            }
        })?;

        Ok((updated, replaced))
    }
}

impl TeamRegistry<'_, DatabaseConnection> {
    /// Persist a team and its six roster rows in one transaction.
    pub async fn register(
        &self,
        app: &TeamApplication,
        evidence: PaymentEvidence,
    ) -> Result<team::Model, AppError> {
        self.check_uniqueness(app).await?;

        let txn = self.conn.begin().await?;
        match insert_team(&txn, app, evidence).await {
            Ok(created) => {
                txn.commit().await?;
                info!(team_id = %created.id, team_name = %created.team_name, "Team registered");
                Ok(created)
            }
            Err(e) => {
                txn.rollback().await?;
                if !matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(e.into());
                }
                warn!(team_name = %app.team_name, "Registration lost a uniqueness race");
                // Re-run the checks to name the value that won the race.
                self.check_uniqueness(app).await?;
                Err(AppError::Conflict(
                    "Team details conflict with an existing registration".into(),
                ))
            }
        }
    }

    /// Delete a team, its roster and its submissions. Returns the object keys
    /// that belonged to them so the caller can remove the stored files.
    pub async fn delete(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let existing = self.find(id).await?;

        let txn = self.conn.begin().await?;
        let submissions = ppt_submission::Entity::find()
            .filter(ppt_submission::Column::TeamId.eq(id))
            .all(&txn)
            .await?;
        ppt_submission::Entity::delete_many()
            .filter(ppt_submission::Column::TeamId.eq(id))
            .exec(&txn)
            .await?;
        team_member::Entity::delete_many()
            .filter(team_member::Column::TeamId.eq(id))
            .exec(&txn)
            .await?;
        team::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(team_id = %id, team_name = %existing.team_name, "Team deleted");

        let mut keys: Vec<String> = submissions.into_iter().map(|s| s.file_key).collect();
        keys.push(existing.screenshot_key);
        Ok(keys)
    }
}

async fn insert_team<C: ConnectionTrait>(
    conn: &C,
    app: &TeamApplication,
    evidence: PaymentEvidence,
) -> Result<team::Model, DbErr> {
    let now = Utc::now();
    let created = team::ActiveModel {
        id: Set(Uuid::now_v7()),
        team_name: Set(app.team_name.clone()),
        team_name_key: Set(team_name_key(&app.team_name)),
        ps_number: Set(app.ps_number.clone()),
        problem_statement: Set(app.problem_statement.clone()),
        payment_status: Set(PaymentStatus::Paid),
        transaction_id: Set(evidence.transaction_id),
        screenshot_key: Set(evidence.screenshot_key),
        screenshot_url: Set(evidence.screenshot_url),
        screenshot_name: Set(evidence.screenshot_name),
        screenshot_mime: Set(evidence.screenshot_mime),
        registered_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let members = app.roster.slots().map(|(slot, p)| team_member::ActiveModel {
        team_id: Set(created.id),
        slot: Set(slot),
        name: Set(p.name.clone()),
        enrollment: Set(p.enrollment.clone()),
        email: Set(p.email.clone()),
        ..Default::default()
    });
    team_member::Entity::insert_many(members)
        .exec_without_returning(conn)
        .await?;

    Ok(created)
}

/// Case-insensitive identity of a team name.
pub fn team_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
