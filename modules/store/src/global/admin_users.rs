//! Admin-user and admin-role queries.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::{admin_role, admin_user};
use crate::types::UserStatus;

pub async fn create<C: ConnectionTrait>(
    c: &C,
    id: Uuid,
    email: &str,
    status: UserStatus,
    preferred_language: &str,
) -> Result<()> {
    admin_user::Entity::insert(admin_user::ActiveModel {
        id: Set(id),
        email: Set(email.to_owned()),
        password_hash: Set(None),
        status: Set(status),
        full_name: Set(None),
        preferred_language: Set(preferred_language.to_owned()),
        created_at: Set(Utc::now()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<Option<admin_user::Model>> {
    admin_user::Entity::find_by_id(id)
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn find_by_email<C: ConnectionTrait>(
    c: &C,
    email: &str,
) -> Result<Option<admin_user::Model>> {
    admin_user::Entity::find()
        .filter(admin_user::Column::Email.eq(email))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn set_password<C: ConnectionTrait>(c: &C, id: Uuid, password_hash: &str) -> Result<()> {
    let res = admin_user::Entity::update_many()
        .col_expr(
            admin_user::Column::PasswordHash,
            Expr::value(Some(password_hash)),
        )
        .filter(admin_user::Column::Id.eq(id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn set_status<C: ConnectionTrait>(c: &C, id: Uuid, status: UserStatus) -> Result<()> {
    let res = admin_user::Entity::update_many()
        .col_expr(admin_user::Column::Status, Expr::value(status))
        .filter(admin_user::Column::Id.eq(id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Activate an invited admin with the profile and password collected at
/// setup time.
pub async fn activate<C: ConnectionTrait>(
    c: &C,
    id: Uuid,
    full_name: &str,
    preferred_language: &str,
    password_hash: &str,
) -> Result<()> {
    let res = admin_user::Entity::update_many()
        .col_expr(admin_user::Column::Status, Expr::value(UserStatus::Active))
        .col_expr(admin_user::Column::FullName, Expr::value(Some(full_name)))
        .col_expr(
            admin_user::Column::PreferredLanguage,
            Expr::value(preferred_language),
        )
        .col_expr(
            admin_user::Column::PasswordHash,
            Expr::value(Some(password_hash)),
        )
        .filter(admin_user::Column::Id.eq(id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Load all ACTIVE admins with row locks (`SELECT ... FOR UPDATE`).
///
/// The last-admin guard must call this inside the same transaction that
/// performs the disable, so concurrent disables serialise on these locks
/// instead of racing an unlocked count.
pub async fn lock_active<C: ConnectionTrait>(c: &C) -> Result<Vec<admin_user::Model>> {
    admin_user::Entity::find()
        .filter(admin_user::Column::Status.eq(UserStatus::Active))
        .order_by_asc(admin_user::Column::Id)
        .lock_exclusive()
        .all(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<()> {
    admin_user::Entity::delete_by_id(id)
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

// --- role membership ---

pub async fn add_role<C: ConnectionTrait>(c: &C, admin_user_id: Uuid, role: &str) -> Result<()> {
    admin_role::Entity::insert(admin_role::ActiveModel {
        admin_user_id: Set(admin_user_id),
        role: Set(role.to_owned()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn remove_role<C: ConnectionTrait>(c: &C, admin_user_id: Uuid, role: &str) -> Result<()> {
    let res = admin_role::Entity::delete_many()
        .filter(admin_role::Column::AdminUserId.eq(admin_user_id))
        .filter(admin_role::Column::Role.eq(role))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn roles_of<C: ConnectionTrait>(c: &C, admin_user_id: Uuid) -> Result<Vec<String>> {
    let rows = admin_role::Entity::find()
        .filter(admin_role::Column::AdminUserId.eq(admin_user_id))
        .all(c)
        .await
        .map_err(DbError::from)?;
    Ok(rows.into_iter().map(|r| r.role).collect())
}
