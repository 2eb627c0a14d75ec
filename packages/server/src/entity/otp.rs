use common::OtpPurpose;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otp")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Lower-cased recipient address.
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,

    /// Set once the mail carrying the code was accepted by the provider.
    /// Undelivered codes never verify.
    #[sea_orm(default_value = false)]
    pub delivered: bool,
    #[sea_orm(default_value = false)]
    pub is_used: bool,

    #[sea_orm(indexed)]
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub used_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
