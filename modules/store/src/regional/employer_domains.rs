//! Per-region domain verification state.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::employer_domain;
use crate::types::DomainStatus;

pub struct NewRegionalDomain<'a> {
    pub employer_id: Uuid,
    pub domain: &'a str,
    pub verification_token: &'a str,
    pub token_expires_at: DateTime<Utc>,
    pub status: DomainStatus,
    pub last_verified_at: Option<DateTime<Utc>>,
}

pub async fn create<C: ConnectionTrait>(c: &C, row: NewRegionalDomain<'_>) -> Result<()> {
    employer_domain::Entity::insert(employer_domain::ActiveModel {
        employer_id: Set(row.employer_id),
        domain: Set(row.domain.to_owned()),
        verification_token: Set(row.verification_token.to_owned()),
        token_expires_at: Set(row.token_expires_at),
        status: Set(row.status),
        consecutive_failures: Set(0),
        last_verified_at: Set(row.last_verified_at),
        created_at: Set(Utc::now()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find<C: ConnectionTrait>(
    c: &C,
    employer_id: Uuid,
    domain: &str,
) -> Result<Option<employer_domain::Model>> {
    employer_domain::Entity::find_by_id((employer_id, domain.to_owned()))
        .one(c)
        .await
        .map_err(DbError::from)
}

/// Record a verification success: VERIFIED, counter reset, fresh
/// `last_verified_at`.
pub async fn mark_verified<C: ConnectionTrait>(
    c: &C,
    employer_id: Uuid,
    domain: &str,
    verified_at: DateTime<Utc>,
) -> Result<()> {
    let res = employer_domain::Entity::update_many()
        .col_expr(
            employer_domain::Column::Status,
            Expr::value(DomainStatus::Verified),
        )
        .col_expr(employer_domain::Column::ConsecutiveFailures, Expr::value(0))
        .col_expr(
            employer_domain::Column::LastVerifiedAt,
            Expr::value(Some(verified_at)),
        )
        .filter(employer_domain::Column::EmployerId.eq(employer_id))
        .filter(employer_domain::Column::Domain.eq(domain))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Record a verification failure: bump the counter and move to the given
/// status (`Pending` stays `Pending`; `Verified` degrades to `Failing` only
/// at the threshold). `last_verified_at` is preserved.
pub async fn mark_failed<C: ConnectionTrait>(
    c: &C,
    employer_id: Uuid,
    domain: &str,
    status: DomainStatus,
    consecutive_failures: i32,
) -> Result<()> {
    let res = employer_domain::Entity::update_many()
        .col_expr(employer_domain::Column::Status, Expr::value(status))
        .col_expr(
            employer_domain::Column::ConsecutiveFailures,
            Expr::value(consecutive_failures),
        )
        .filter(employer_domain::Column::EmployerId.eq(employer_id))
        .filter(employer_domain::Column::Domain.eq(domain))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    if res.rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(c: &C, employer_id: Uuid, domain: &str) -> Result<()> {
    employer_domain::Entity::delete_by_id((employer_id, domain.to_owned()))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}
