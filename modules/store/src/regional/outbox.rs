//! Email outbox. Rows are enqueued inside the same transaction as the token
//! they reference, so either both exist or neither does.

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect};
use vetchium_db::{DbError, Result};

use super::entity::email_outbox;
use crate::types::EmailKind;

pub struct NewEmail<'a> {
    pub email_type: EmailKind,
    pub to_addr: &'a str,
    pub subject: &'a str,
    pub text_body: &'a str,
    pub html_body: &'a str,
}

pub async fn enqueue<C: ConnectionTrait>(c: &C, email: NewEmail<'_>) -> Result<()> {
    email_outbox::Entity::insert(email_outbox::ActiveModel {
        email_type: Set(email.email_type),
        to_addr: Set(email.to_addr.to_owned()),
        subject: Set(email.subject.to_owned()),
        text_body: Set(email.text_body.to_owned()),
        html_body: Set(email.html_body.to_owned()),
        created_at: Set(Utc::now()),
        ..Default::default()
    })
    .exec_without_returning(c)
    .await
    .map_err(DbError::from)?;
    Ok(())
}

/// Oldest-first batch, the order the external mailer drains in.
pub async fn oldest<C: ConnectionTrait>(c: &C, limit: u64) -> Result<Vec<email_outbox::Model>> {
    email_outbox::Entity::find()
        .order_by_asc(email_outbox::Column::Id)
        .limit(limit)
        .all(c)
        .await
        .map_err(DbError::from)
}
