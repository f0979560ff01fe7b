//! Global org-user projection queries.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::org_user;
use crate::types::UserStatus;

pub struct NewGlobalOrgUser<'a> {
    pub id: Uuid,
    pub email_hash: &'a str,
    pub employer_id: Uuid,
    pub home_region: &'a str,
    pub status: UserStatus,
    pub preferred_language: &'a str,
    pub full_name: Option<&'a str>,
}

pub async fn create<C: ConnectionTrait>(c: &C, user: NewGlobalOrgUser<'_>) -> Result<()> {
    org_user::Entity::insert(org_user::ActiveModel {
        id: Set(user.id),
        email_hash: Set(user.email_hash.to_owned()),
        employer_id: Set(user.employer_id),
        home_region: Set(user.home_region.to_owned()),
        status: Set(user.status),
        full_name: Set(user.full_name.map(str::to_owned)),
        preferred_language: Set(user.preferred_language.to_owned()),
        created_at: Set(Utc::now()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<Option<org_user::Model>> {
    org_user::Entity::find_by_id(id)
        .one(c)
        .await
        .map_err(DbError::from)
}

/// Lookup by (email hash, employer): the org-plane identity key.
pub async fn find_by_email_hash<C: ConnectionTrait>(
    c: &C,
    email_hash: &str,
    employer_id: Uuid,
) -> Result<Option<org_user::Model>> {
    org_user::Entity::find()
        .filter(org_user::Column::EmailHash.eq(email_hash))
        .filter(org_user::Column::EmployerId.eq(employer_id))
        .one(c)
        .await
        .map_err(DbError::from)
}

/// Lookup across all employers; signup uses this to reject addresses that
/// already own an org account.
pub async fn find_any_by_email_hash<C: ConnectionTrait>(
    c: &C,
    email_hash: &str,
) -> Result<Option<org_user::Model>> {
    org_user::Entity::find()
        .filter(org_user::Column::EmailHash.eq(email_hash))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn set_status<C: ConnectionTrait>(c: &C, id: Uuid, status: UserStatus) -> Result<()> {
    let res = org_user::Entity::update_many()
        .col_expr(org_user::Column::Status, Expr::value(status))
        .filter(org_user::Column::Id.eq(id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Activate an invited user and fill in the profile fields collected at
/// invitation-setup time.
pub async fn activate<C: ConnectionTrait>(
    c: &C,
    id: Uuid,
    full_name: &str,
    preferred_language: &str,
) -> Result<()> {
    let res = org_user::Entity::update_many()
        .col_expr(org_user::Column::Status, Expr::value(UserStatus::Active))
        .col_expr(org_user::Column::FullName, Expr::value(Some(full_name)))
        .col_expr(
            org_user::Column::PreferredLanguage,
            Expr::value(preferred_language),
        )
        .filter(org_user::Column::Id.eq(id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<()> {
    org_user::Entity::delete_by_id(id)
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}
