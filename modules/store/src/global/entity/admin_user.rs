use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::UserStatus;

/// Platform administrator. Single-tenant: lives only in the global store.
/// `password_hash` is empty until invitation setup completes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    pub status: UserStatus,
    pub full_name: Option<String>,
    pub preferred_language: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
