use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// Employer role membership. One row per (user, role); cascades with the
/// regional user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "org_user_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub org_user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
