//! Org password reset.

use chrono::Utc;
use vetchium_federation::{token, RegionCode};
use vetchium_store::global::{employers, org_users};
use vetchium_store::regional::outbox::NewEmail;
use vetchium_store::regional::{org_users as regional_users, outbox, tokens};
use vetchium_store::types::{EmailKind, TokenKind, UserStatus};

use super::{email_domain, validate_password, OrgAuthService};
use crate::config::chrono_ttl;
use crate::domain::emails;
use crate::domain::error::DomainError;

impl OrgAuthService {
    /// Request a reset. The response is identical whether or not the
    /// account exists, so the endpoint cannot be used to enumerate
    /// addresses; when the account does resolve, token and email are
    /// created in one regional transaction.
    ///
    /// # Errors
    /// Validation errors for malformed input; lookups that miss are NOT
    /// errors.
    pub async fn request_password_reset(
        &self,
        email: &str,
        domain: &str,
    ) -> Result<(), DomainError> {
        email_domain(email)?;

        let Some(routing) =
            employers::find_domain(self.global.conn(), &domain.to_ascii_lowercase()).await?
        else {
            return Ok(());
        };
        let email_hash = token::hash_email(email);
        let Some(global_user) =
            org_users::find_by_email_hash(self.global.conn(), &email_hash, routing.employer_id)
                .await?
        else {
            return Ok(());
        };
        if global_user.status != UserStatus::Active {
            return Ok(());
        }
        let Ok(region) = RegionCode::parse(&routing.region) else {
            return Ok(());
        };
        let regional_db = self.regional(&region)?;
        let Some(regional_user) = regional_users::find(regional_db.conn(), global_user.id).await?
        else {
            return Ok(());
        };

        let reset_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.org_password_reset);
        let wire_token = token::prefixed(&region, &reset_token);
        let mail = emails::password_reset(&self.cfg.ui_urls.org, &wire_token);

        let user_id = global_user.id;
        let to_addr = regional_user.email.clone();
        let bare = reset_token.clone();
        regional_db
            .with_tx(move |tx| {
                Box::pin(async move {
                    tokens::create_org_token(
                        tx,
                        &bare,
                        TokenKind::PasswordReset,
                        user_id,
                        None,
                        expires_at,
                    )
                    .await?;
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::OrgPasswordReset,
                            to_addr: &to_addr,
                            subject: &mail.subject,
                            text_body: &mail.text_body,
                            html_body: &mail.html_body,
                        },
                    )
                    .await
                    .map_err(DomainError::from)
                })
            })
            .await?;

        Ok(())
    }

    /// Complete a reset: new password, token gone, every session gone, all
    /// in one regional transaction.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired/consumed tokens.
    pub async fn complete_password_reset(
        &self,
        region: &RegionCode,
        bare_token: &str,
        password: &str,
    ) -> Result<(), DomainError> {
        let regional_db = self.regional(region)?;
        let row = tokens::find_org_token(regional_db.conn(), bare_token, TokenKind::PasswordReset)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        validate_password(password)?;
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user_id = row.org_user_id;
        let consumed = bare_token.to_owned();
        regional_db
            .with_tx(move |tx| {
                Box::pin(async move {
                    regional_users::set_password(tx, user_id, &password_hash).await?;
                    tokens::delete_org_token(tx, &consumed).await?;
                    tokens::delete_sessions_for(tx, user_id)
                        .await
                        .map_err(DomainError::from)
                })
            })
            .await?;

        Ok(())
    }
}
