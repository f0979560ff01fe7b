//! Admin password reset.

use chrono::Utc;
use vetchium_federation::{token, Saga};
use vetchium_store::global::{admin_users, tokens};
use vetchium_store::regional::outbox::{self, NewEmail};
use vetchium_store::types::{EmailKind, TokenKind, UserStatus};

use super::AdminAuthService;
use crate::config::chrono_ttl;
use crate::domain::emails;
use crate::domain::error::DomainError;
use crate::domain::org::validate_password;

impl AdminAuthService {
    /// Request a reset; the response never reveals whether the address is
    /// an administrator.
    ///
    /// # Errors
    /// Infrastructure errors only; misses are not errors.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(admin) =
            admin_users::find_by_email(self.global.conn(), &email.to_ascii_lowercase()).await?
        else {
            return Ok(());
        };
        if admin.status != UserStatus::Active {
            return Ok(());
        }

        let reset_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.admin_password_reset);

        let mut saga: Saga<DomainError> = Saga::new("admin_password_reset_request");
        saga.run_with_undo(
            "create_reset_token",
            async {
                tokens::create_admin_token(
                    self.global.conn(),
                    &reset_token,
                    TokenKind::PasswordReset,
                    admin.id,
                    None,
                    expires_at,
                )
                .await
                .map_err(DomainError::from)
            },
            {
                let global = self.global.clone();
                let reset_token = reset_token.clone();
                move || async move {
                    tokens::delete_admin_token(global.conn(), &reset_token)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        let mail = emails::password_reset(&self.cfg.ui_urls.admin, &reset_token);
        let to_addr = admin.email.clone();
        saga.run(
            "enqueue_reset_email",
            self.registry.local_db().with_tx(move |tx| {
                Box::pin(async move {
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::AdminPasswordReset,
                            to_addr: &to_addr,
                            subject: &mail.subject,
                            text_body: &mail.text_body,
                            html_body: &mail.html_body,
                        },
                    )
                    .await
                    .map_err(DomainError::from)
                })
            }),
        )
        .await?;

        saga.commit();
        Ok(())
    }

    /// Complete a reset in one global transaction: password update, token
    /// delete, all sessions gone.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired/consumed tokens.
    pub async fn complete_password_reset(
        &self,
        reset_token: &str,
        password: &str,
    ) -> Result<(), DomainError> {
        let row =
            tokens::find_admin_token(self.global.conn(), reset_token, TokenKind::PasswordReset)
                .await?
                .ok_or(DomainError::Unauthorized)?;

        validate_password(password)?;
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let admin_id = row.admin_user_id;
        let consumed = reset_token.to_owned();
        self.global
            .with_tx(move |tx| {
                Box::pin(async move {
                    admin_users::set_password(tx, admin_id, &password_hash).await?;
                    tokens::delete_admin_token(tx, &consumed).await?;
                    tokens::delete_admin_sessions_for(tx, admin_id)
                        .await
                        .map_err(DomainError::from)
                })
            })
            .await?;

        Ok(())
    }
}
