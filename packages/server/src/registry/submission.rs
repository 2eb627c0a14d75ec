use std::collections::HashSet;

use chrono::Utc;
use common::ReviewStatus;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ExprTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::{ppt_submission, team};
use crate::error::AppError;
use crate::models::admin::{ReviewRequest, SortOrder, SubmissionListQuery, SubmissionSortField};
use crate::models::shared::{escape_like, non_blank};
use crate::utils::submission::{is_late, next_version, submission_deadline};
use crate::utils::upload::UploadedFile;

/// Everything needed to record a presentation for a team.
pub struct NewSubmission<'a> {
    pub team: &'a team::Model,
    pub leader_email: &'a str,
    pub file: &'a UploadedFile,
    pub file_url: String,
    pub window_days: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    Created(ppt_submission::Model),
    /// The team already had a submission; nothing was written.
    AlreadySubmitted(ppt_submission::Model),
}

/// Aggregates over all submissions.
#[derive(Debug, Default)]
pub struct SubmissionStatsRow {
    pub total: u64,
    pub late: u64,
    pub by_status: Vec<(ReviewStatus, u64)>,
    pub average_score: Option<f64>,
}

/// Owns presentation submissions and their review state.
///
/// A team gets exactly one submission through the public flow. Versions are
/// still numbered per team, and `(team_id, version)` is unique, so two
/// racing submissions cannot both be stored.
pub struct SubmissionRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SubmissionRegistry<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<ppt_submission::Model, AppError> {
        ppt_submission::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("PPT submission not found".into()))
    }

    /// Authoritative submission of a team: the highest version.
    pub async fn latest_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Option<ppt_submission::Model>, DbErr> {
        ppt_submission::Entity::find()
            .filter(ppt_submission::Column::TeamId.eq(team_id))
            .order_by_desc(ppt_submission::Column::Version)
            .one(self.conn)
            .await
    }

    /// Ids of teams holding at least one submission.
    pub async fn submitted_team_ids(&self) -> Result<HashSet<Uuid>, DbErr> {
        let ids: Vec<Uuid> = ppt_submission::Entity::find()
            .select_only()
            .column(ppt_submission::Column::TeamId)
            .distinct()
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Record a submission unless the team already has one.
    pub async fn submit(&self, new: NewSubmission<'_>) -> Result<SubmissionOutcome, DbErr> {
        if let Some(existing) = self.latest_for_team(new.team.id).await? {
            return Ok(SubmissionOutcome::AlreadySubmitted(existing));
        }

        let team_id = new.team.id;
        match self.insert_version(new, None).await {
            Ok(created) => Ok(SubmissionOutcome::Created(created)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // A concurrent request stored version 1 first.
                let existing = self.latest_for_team(team_id).await?.ok_or_else(|| {
                    DbErr::Custom("unique violation but no submission found".into())
                })?;
                Ok(SubmissionOutcome::AlreadySubmitted(existing))
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_version(
        &self,
        new: NewSubmission<'_>,
        current_max: Option<i32>,
    ) -> Result<ppt_submission::Model, DbErr> {
        let now = Utc::now();
        let deadline = submission_deadline(new.team.registered_at, new.window_days);
        let late = is_late(now, deadline);

        let created = ppt_submission::ActiveModel {
            team_id: Set(new.team.id),
            team_name: Set(new.team.team_name.clone()),
            leader_email: Set(new.leader_email.to_string()),
            file_key: Set(new.file.object.key.as_str().to_string()),
            file_url: Set(new.file_url),
            original_name: Set(new.file.original_name.clone()),
            file_size: Set(new.file.object.size as i64),
            mime_type: Set(new.file.mime_type.clone()),
            checksum: Set(new.file.object.checksum.to_hex()),
            submitted_at: Set(now),
            status: Set(ReviewStatus::Submitted),
            review_comments: Set(None),
            reviewed_by: Set(None),
            review_date: Set(None),
            score: Set(None),
            version: Set(next_version(current_max)),
            is_late: Set(late),
            deadline: Set(deadline),
            ip_address: Set(new.ip_address),
            user_agent: Set(new.user_agent),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        info!(
            submission_id = created.id,
            team_id = %created.team_id,
            version = created.version,
            late,
            "Presentation submitted"
        );
        Ok(created)
    }

    /// Apply a review. Any status may follow any other.
    pub async fn review(
        &self,
        id: i32,
        review: ReviewRequest,
        reviewer_id: i32,
    ) -> Result<ppt_submission::Model, AppError> {
        review.validate()?;
        let existing = self.find(id).await?;

        let mut active: ppt_submission::ActiveModel = existing.into();
        active.status = Set(review.status);
        active.review_comments = Set(review.comments.map(|c| c.trim().to_string()));
        active.score = Set(review.score);
        active.reviewed_by = Set(Some(reviewer_id));
        active.review_date = Set(Some(Utc::now()));
        let updated = active.update(self.conn).await?;

        info!(submission_id = id, reviewer_id, status = %updated.status, "Submission reviewed");
        Ok(updated)
    }

    /// One page of submissions plus the total matching count.
    pub async fn list(
        &self,
        query: &SubmissionListQuery,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ppt_submission::Model>, u64), DbErr> {
        let select = filtered(query);
        let total = select.clone().paginate(self.conn, per_page).num_items().await?;

        let order = match query.sort_order.unwrap_or_default() {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let column = match query.sort_by.unwrap_or_default() {
            SubmissionSortField::SubmittedAt => ppt_submission::Column::SubmittedAt,
            SubmissionSortField::TeamName => ppt_submission::Column::TeamName,
            SubmissionSortField::Status => ppt_submission::Column::Status,
        };

        let rows = select
            .order_by(column, order)
            .order_by_desc(ppt_submission::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;

        Ok((rows, total))
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        ppt_submission::Entity::find().count(self.conn).await
    }

    pub async fn stats(&self) -> Result<SubmissionStatsRow, DbErr> {
        let total = self.count().await?;
        let late = ppt_submission::Entity::find()
            .filter(ppt_submission::Column::IsLate.eq(true))
            .count(self.conn)
            .await?;

        let grouped: Vec<(ReviewStatus, i64)> = ppt_submission::Entity::find()
            .select_only()
            .column(ppt_submission::Column::Status)
            .column_as(ppt_submission::Column::Id.count(), "count")
            .group_by(ppt_submission::Column::Status)
            .into_tuple()
            .all(self.conn)
            .await?;
        let by_status = ReviewStatus::ALL
            .iter()
            .map(|status| {
                let n = grouped
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, n)| *n as u64);
                (*status, n)
            })
            .collect();

        let scores: Vec<i32> = ppt_submission::Entity::find()
            .select_only()
            .column(ppt_submission::Column::Score)
            .filter(ppt_submission::Column::Score.is_not_null())
            .into_tuple()
            .all(self.conn)
            .await?;
        let average_score = (!scores.is_empty())
            .then(|| scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64);

        Ok(SubmissionStatsRow {
            total,
            late,
            by_status,
            average_score,
        })
    }
}

fn filtered(query: &SubmissionListQuery) -> Select<ppt_submission::Entity> {
    let mut select = ppt_submission::Entity::find();

    if let Some(status) = query.status {
        select = select.filter(ppt_submission::Column::Status.eq(status));
    }

    if let Some(search) = non_blank(query.search.as_deref()) {
        let pattern = format!("%{}%", escape_like(search).to_lowercase());
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(ppt_submission::Column::TeamName)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(ppt_submission::Column::LeaderEmail)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    select
}
