use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::DomainStatus;

/// The routing record for a claimed domain: globally unique, maps the domain
/// to its employer and home region. Deletion of the employer cascades here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employer_domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: String,
    pub employer_id: Uuid,
    pub region: String,
    pub status: DomainStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
