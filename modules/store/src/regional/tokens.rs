//! Org-plane tokens and sessions.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::{org_session, org_token};
use crate::types::TokenKind;

pub async fn create_org_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
    kind: TokenKind,
    org_user_id: Uuid,
    tfa_code: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    org_token::Entity::insert(org_token::ActiveModel {
        token: Set(token.to_owned()),
        kind: Set(kind),
        org_user_id: Set(org_user_id),
        tfa_code: Set(tfa_code.map(str::to_owned)),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_org_token<C: ConnectionTrait>(
    c: &C,
    token: &str,
    kind: TokenKind,
) -> Result<Option<org_token::Model>> {
    org_token::Entity::find_by_id(token.to_owned())
        .filter(org_token::Column::Kind.eq(kind))
        .filter(org_token::Column::ExpiresAt.gt(Utc::now()))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete_org_token<C: ConnectionTrait>(c: &C, token: &str) -> Result<()> {
    org_token::Entity::delete_by_id(token.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

// --- sessions ---

pub async fn create_session<C: ConnectionTrait>(
    c: &C,
    token: &str,
    org_user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    org_session::Entity::insert(org_session::ActiveModel {
        token: Set(token.to_owned()),
        org_user_id: Set(org_user_id),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_session<C: ConnectionTrait>(
    c: &C,
    token: &str,
) -> Result<Option<org_session::Model>> {
    org_session::Entity::find_by_id(token.to_owned())
        .filter(org_session::Column::ExpiresAt.gt(Utc::now()))
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn delete_session<C: ConnectionTrait>(c: &C, token: &str) -> Result<()> {
    org_session::Entity::delete_by_id(token.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

/// Delete every session a user holds. Password-reset completion and account
/// disable both call this inside their regional transaction.
pub async fn delete_sessions_for<C: ConnectionTrait>(c: &C, org_user_id: Uuid) -> Result<()> {
    org_session::Entity::delete_many()
        .filter(org_session::Column::OrgUserId.eq(org_user_id))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}
