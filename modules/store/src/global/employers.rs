//! Employer and routing-domain queries.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use vetchium_db::{DbError, Result};

use super::entity::{employer, employer_domain};
use crate::types::DomainStatus;

/// Create an employer. The caller supplies the id so saga compensators can
/// reference it before the transaction commits.
pub async fn create<C: ConnectionTrait>(
    c: &C,
    id: Uuid,
    display_name: &str,
    home_region: &str,
) -> Result<employer::Model> {
    let now = Utc::now();
    let row = employer::Model {
        id,
        display_name: display_name.to_owned(),
        home_region: home_region.to_owned(),
        created_at: now,
    };
    employer::Entity::insert(employer::ActiveModel {
        id: Set(row.id),
        display_name: Set(row.display_name.clone()),
        home_region: Set(row.home_region.clone()),
        created_at: Set(row.created_at),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(row)
}

pub async fn find<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<Option<employer::Model>> {
    employer::Entity::find_by_id(id)
        .one(c)
        .await
        .map_err(DbError::from)
}

/// Delete an employer. Cascades to its routing domains and global org users.
pub async fn delete<C: ConnectionTrait>(c: &C, id: Uuid) -> Result<()> {
    employer::Entity::delete_by_id(id)
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

/// Create the routing record for a claimed domain. The unique primary key on
/// `domain` is what serialises concurrent claims and signups.
pub async fn create_domain<C: ConnectionTrait>(
    c: &C,
    domain: &str,
    employer_id: Uuid,
    region: &str,
    status: DomainStatus,
) -> Result<()> {
    employer_domain::Entity::insert(employer_domain::ActiveModel {
        domain: Set(domain.to_owned()),
        employer_id: Set(employer_id),
        region: Set(region.to_owned()),
        status: Set(status),
        created_at: Set(Utc::now()),
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

pub async fn find_domain<C: ConnectionTrait>(
    c: &C,
    domain: &str,
) -> Result<Option<employer_domain::Model>> {
    employer_domain::Entity::find_by_id(domain.to_owned())
        .one(c)
        .await
        .map_err(DbError::from)
}

pub async fn set_domain_status<C: ConnectionTrait>(
    c: &C,
    domain: &str,
    status: DomainStatus,
) -> Result<()> {
    employer_domain::Entity::update_many()
        .col_expr(employer_domain::Column::Status, Expr::value(status))
        .filter(employer_domain::Column::Domain.eq(domain))
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

pub async fn delete_domain<C: ConnectionTrait>(c: &C, domain: &str) -> Result<()> {
    employer_domain::Entity::delete_by_id(domain.to_owned())
        .exec(c)
        .await
        .map_err(DbError::from)?;
    Ok(())
}
