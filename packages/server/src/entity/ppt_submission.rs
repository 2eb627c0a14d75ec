use common::ReviewStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ppt_submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "team_version")]
    pub team_id: Uuid,
    #[sea_orm(belongs_to, from = "team_id", to = "id", on_delete = "Cascade")]
    pub team: HasOne<super::team::Entity>,

    /// Denormalized from the team when the submission is created.
    pub team_name: String,
    pub leader_email: String,

    pub file_key: String,
    pub file_url: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    /// Hex SHA-256 of the stored file.
    pub checksum: String,

    pub submitted_at: DateTimeUtc,
    pub status: ReviewStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_comments: Option<String>,
    pub reviewed_by: Option<i32>,
    #[sea_orm(belongs_to, from = "reviewed_by", to = "id", on_delete = "SetNull")]
    pub reviewer: HasOne<super::admin::Entity>,
    pub review_date: Option<DateTimeUtc>,
    /// 0-100 when scored.
    pub score: Option<i32>,

    /// Starts at 1 and increases per team.
    #[sea_orm(unique_key = "team_version")]
    pub version: i32,
    pub is_late: bool,
    pub deadline: DateTimeUtc,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
