use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::DomainStatus;

/// Per-region verification state for a claimed domain. Exactly one row per
/// (employer, domain); the verification token is the DNS TXT proof value.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employer_domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub employer_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: String,
    pub verification_token: String,
    pub token_expires_at: DateTimeUtc,
    pub status: DomainStatus,
    pub consecutive_failures: i32,
    pub last_verified_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
