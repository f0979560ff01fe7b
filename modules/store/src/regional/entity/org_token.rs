use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::types::TokenKind;

/// Org-plane TFA / invitation / password-reset tokens. Stored bare; the
/// region prefix exists only on the wire.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "org_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub kind: TokenKind,
    pub org_user_id: Uuid,
    pub tfa_code: Option<String>,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
