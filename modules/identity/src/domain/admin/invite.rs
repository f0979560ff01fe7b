//! Admin invitations and setup completion.

use chrono::Utc;
use uuid::Uuid;
use vetchium_federation::{token, Saga};
use vetchium_store::global::{admin_users, tokens};
use vetchium_store::regional::outbox::{self, NewEmail};
use vetchium_store::types::{EmailKind, TokenKind, UserStatus};

use super::AdminAuthService;
use crate::config::chrono_ttl;
use crate::domain::emails;
use crate::domain::error::DomainError;
use crate::domain::org::{email_domain, validate_full_name, validate_password};

impl AdminAuthService {
    /// Invite a new administrator. User and invitation token are created in
    /// one global transaction (the token cascades with the user, so the
    /// compensator is a single delete); the email goes through the local
    /// region's outbox.
    ///
    /// # Errors
    /// `Conflict` when the address already belongs to an admin.
    pub async fn invite_admin(&self, email: &str) -> Result<(), DomainError> {
        email_domain(email)?;
        let email = email.to_ascii_lowercase();
        if admin_users::find_by_email(self.global.conn(), &email)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("admin already exists"));
        }

        let admin_id = Uuid::new_v4();
        let invitation_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.admin_invitation);

        let mut saga: Saga<DomainError> = Saga::new("admin_invite");

        saga.run_with_undo(
            "create_admin_and_invitation",
            {
                let email = email.clone();
                let invitation_token = invitation_token.clone();
                let language = self.cfg.default_language.clone();
                self.global.with_tx(move |tx| {
                    Box::pin(async move {
                        admin_users::create(tx, admin_id, &email, UserStatus::Invited, &language)
                            .await?;
                        tokens::create_admin_token(
                            tx,
                            &invitation_token,
                            TokenKind::Invitation,
                            admin_id,
                            None,
                            expires_at,
                        )
                        .await
                        .map_err(DomainError::from)
                    })
                })
            },
            {
                let global = self.global.clone();
                move || async move {
                    admin_users::delete(global.conn(), admin_id)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        let mail = emails::admin_invitation(&self.cfg.ui_urls.admin, &invitation_token);
        saga.run(
            "enqueue_invitation_email",
            self.registry.local_db().with_tx(move |tx| {
                Box::pin(async move {
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::AdminInvitation,
                            to_addr: &email,
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
        tracing::info!(admin_id = %admin_id, "admin invited");
        Ok(())
    }

    /// Complete admin setup: activation, profile, password and the
    /// single-use token delete all commit in one global transaction.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired tokens, `Conflict` when already
    /// completed.
    pub async fn complete_setup(
        &self,
        invitation_token: &str,
        full_name: &str,
        password: &str,
        preferred_language: Option<&str>,
    ) -> Result<(), DomainError> {
        let row =
            tokens::find_admin_token(self.global.conn(), invitation_token, TokenKind::Invitation)
                .await?
                .ok_or(DomainError::Unauthorized)?;

        let admin = admin_users::find(self.global.conn(), row.admin_user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if admin.status != UserStatus::Invited {
            return Err(DomainError::conflict("setup already completed"));
        }

        validate_full_name(full_name)?;
        validate_password(password)?;
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let admin_id = admin.id;
        let full_name = full_name.to_owned();
        let language = preferred_language
            .unwrap_or(&self.cfg.default_language)
            .to_owned();
        let consumed = invitation_token.to_owned();
        self.global
            .with_tx(move |tx| {
                Box::pin(async move {
                    admin_users::activate(tx, admin_id, &full_name, &language, &password_hash)
                        .await?;
                    tokens::delete_admin_token(tx, &consumed)
                        .await
                        .map_err(DomainError::from)
                })
            })
            .await?;

        Ok(())
    }
}
