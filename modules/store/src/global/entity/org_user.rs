use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::UserStatus;

/// Global projection of an org user. The email hash is unique per employer,
/// never across employers: the same person may exist at two tenants.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "org_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email_hash: String,
    pub employer_id: Uuid,
    pub home_region: String,
    pub status: UserStatus,
    pub full_name: Option<String>,
    pub preferred_language: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
