//! Regional org-user projection, role membership and the locked
//! last-superadmin guard.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationDef,
};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::{org_user, org_user_role};
use crate::types::UserStatus;

pub struct NewRegionalOrgUser<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub is_admin: bool,
    pub employer_id: Uuid,
    pub status: UserStatus,
    pub full_name: Option<&'a str>,
}

pub async fn create<C: ConnectionTrait>(c: &C, user: NewRegionalOrgUser<'_>) -> Result<()> {
    org_user::Entity::insert(org_user::ActiveModel {
        id: Set(user.id),
        email: Set(user.email.to_owned()),
        password_hash: Set(user.password_hash.map(str::to_owned)),
        is_admin: Set(user.is_admin),
        employer_id: Set(user.employer_id),
        status: Set(user.status),
        full_name: Set(user.full_name.map(str::to_owned)),
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

pub async fn set_password<C: ConnectionTrait>(c: &C, id: Uuid, password_hash: &str) -> Result<()> {
    let res = org_user::Entity::update_many()
        .col_expr(
            org_user::Column::PasswordHash,
            Expr::value(Some(password_hash)),
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

/// Activate an invited user with the profile and password collected at
/// invitation-setup time.
pub async fn activate<C: ConnectionTrait>(
    c: &C,
    id: Uuid,
    full_name: &str,
    password_hash: &str,
) -> Result<()> {
    let res = org_user::Entity::update_many()
        .col_expr(org_user::Column::Status, Expr::value(UserStatus::Active))
        .col_expr(org_user::Column::FullName, Expr::value(Some(full_name)))
        .col_expr(
            org_user::Column::PasswordHash,
            Expr::value(Some(password_hash)),
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

// --- role membership ---

pub async fn add_role<C: ConnectionTrait>(c: &C, org_user_id: Uuid, role: &str) -> Result<()> {
    org_user_role::Entity::insert(org_user_role::ActiveModel {
        org_user_id: Set(org_user_id),
        role: Set(role.to_owned()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn remove_role<C: ConnectionTrait>(c: &C, org_user_id: Uuid, role: &str) -> Result<()> {
    let res = org_user_role::Entity::delete_many()
        .filter(org_user_role::Column::OrgUserId.eq(org_user_id))
        .filter(org_user_role::Column::Role.eq(role))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn roles_of<C: ConnectionTrait>(c: &C, org_user_id: Uuid) -> Result<Vec<String>> {
    let rows = org_user_role::Entity::find()
        .filter(org_user_role::Column::OrgUserId.eq(org_user_id))
        .all(c)
        .await
        .map_err(DbError::from)?;
    Ok(rows.into_iter().map(|r| r.role).collect())
}

fn user_role_join() -> RelationDef {
    org_user::Entity::belongs_to(org_user_role::Entity)
        .from(org_user::Column::Id)
        .to(org_user_role::Column::OrgUserId)
        .into()
}

/// Load the employer's ACTIVE holders of `role` with row locks
/// (`SELECT ... FOR UPDATE`). The last-superadmin guard calls this inside
/// the same regional transaction that performs the disable.
pub async fn lock_active_role_members<C: ConnectionTrait>(
    c: &C,
    employer_id: Uuid,
    role: &str,
) -> Result<Vec<org_user::Model>> {
    org_user::Entity::find()
        .join(JoinType::InnerJoin, user_role_join())
        .filter(org_user_role::Column::Role.eq(role))
        .filter(org_user::Column::EmployerId.eq(employer_id))
        .filter(org_user::Column::Status.eq(UserStatus::Active))
        .order_by_asc(org_user::Column::Id)
        .lock_exclusive()
        .all(c)
        .await
        .map_err(DbError::from)
}
