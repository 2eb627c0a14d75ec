use common::PaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    /// UUIDv7, so public endpoints taking a team id cannot be enumerated.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub team_name: String,
    /// Lower-cased `team_name`, so names differing only in case collide.
    #[sea_orm(unique)]
    pub team_name_key: String,

    pub ps_number: String,
    #[sea_orm(column_type = "Text")]
    pub problem_statement: String,

    /// Leader + 5 members, ordered by slot.
    #[sea_orm(has_many)]
    pub members: HasMany<super::team_member::Entity>,

    pub payment_status: PaymentStatus,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub screenshot_key: String,
    pub screenshot_url: String,
    pub screenshot_name: String,
    pub screenshot_mime: String,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::ppt_submission::Entity>,

    pub registered_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
