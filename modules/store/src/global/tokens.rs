//! Global-side token queries: org signup tokens, admin tokens and admin
//! sessions. Lookups implicitly filter out expired rows; deletion is the
//! only mutation besides creation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::{admin_session, admin_token, signup_token};
use crate::types::TokenKind;

// --- org signup tokens ---

pub async fn create_signup_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
    email: &str,
    region: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    signup_token::Entity::insert(signup_token::ActiveModel {
        token: Set(token.to_owned()),
        email: Set(email.to_owned()),
        region: Set(region.to_owned()),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_signup_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
) -> Result<Option<signup_token::Model>> {
    signup_token::Entity::find_by_id(token.to_owned())
        .filter(signup_token::Column::ExpiresAt.gt(Utc::now()))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete_signup_token<C: ConnectionTrait>(c: &C, token: &str) -> Result<()> {
    signup_token::Entity::delete_by_id(token.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

// --- admin tokens (tfa / invitation / password reset) ---

pub async fn create_admin_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
    kind: TokenKind,
    admin_user_id: Uuid,
    tfa_code: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    admin_token::Entity::insert(admin_token::ActiveModel {
        token: Set(token.to_owned()),
        kind: Set(kind),
        admin_user_id: Set(admin_user_id),
        tfa_code: Set(tfa_code.map(str::to_owned)),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_admin_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
    kind: TokenKind,
) -> Result<Option<admin_token::Model>> {
    admin_token::Entity::find_by_id(token.to_owned())
        .filter(admin_token::Column::Kind.eq(kind))
        .filter(admin_token::Column::ExpiresAt.gt(Utc::now()))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete_admin_token<C: ConnectionTrait>(c: &C, token: &str) -> Result<()> {
    admin_token::Entity::delete_by_id(token.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

// --- admin sessions ---

pub async fn create_admin_session<C: ConnectionTrait>(
    c: &C,
    token: &str,
    admin_user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    admin_session::Entity::insert(admin_session::ActiveModel {
        token: Set(token.to_owned()),
        admin_user_id: Set(admin_user_id),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_admin_session<C: ConnectionTrait>(
    c: &C,
    token: &str,
) -> Result<Option<admin_session::Model>> {
    admin_session::Entity::find_by_id(token.to_owned())
        .filter(admin_session::Column::ExpiresAt.gt(Utc::now()))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete_admin_session<C: ConnectionTrait>(c: &C, token: &str) -> Result<()> {
    admin_session::Entity::delete_by_id(token.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

/// Delete every session an admin holds; password-reset completion calls this
/// so stolen sessions die with the old password.
pub async fn delete_admin_sessions_for<C: ConnectionTrait>(c: &C, admin_user_id: Uuid) -> Result<()> {
    admin_session::Entity::delete_many()
        .filter(admin_session::Column::AdminUserId.eq(admin_user_id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}
