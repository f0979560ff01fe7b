use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::UserStatus;

/// Regional projection of an org user. Shares its primary key with the
/// global projection. The status column mirrors the global one so the
/// last-superadmin guard can lock and count inside a single regional
/// transaction; the global projection stays authoritative for routing.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "org_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub employer_id: Uuid,
    pub status: UserStatus,
    pub full_name: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
