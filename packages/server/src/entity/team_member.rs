use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Slot number of the team leader. Members occupy slots 2..=6.
pub const LEADER_SLOT: i16 = 1;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "team_slot")]
    pub team_id: Uuid,
    #[sea_orm(belongs_to, from = "team_id", to = "id", on_delete = "Cascade")]
    pub team: HasOne<super::team::Entity>,

    #[sea_orm(unique_key = "team_slot")]
    pub slot: i16,

    pub name: String,
    #[sea_orm(unique)]
    pub enrollment: String,
    /// Lower-cased. Required for the leader, optional for members.
    #[sea_orm(unique)]
    pub email: Option<String>,
}

impl Model {
    pub fn is_leader(&self) -> bool {
        self.slot == LEADER_SLOT
    }
}

impl ActiveModelBehavior for ActiveModel {}
