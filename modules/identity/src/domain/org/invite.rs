//! Invitation-based setup for teammates.

use chrono::Utc;
use uuid::Uuid;
use vetchium_federation::{token, RegionCode, Saga};
use vetchium_store::global::org_users::{self, NewGlobalOrgUser};
use vetchium_store::regional::org_users::NewRegionalOrgUser;
use vetchium_store::regional::outbox::NewEmail;
use vetchium_store::regional::{org_users as regional_users, outbox, tokens};
use vetchium_store::types::{EmailKind, TokenKind, UserStatus};

use super::{email_domain, validate_full_name, validate_password, OrgAuthService};
use crate::config::chrono_ttl;
use crate::domain::context::OrgContext;
use crate::domain::emails;
use crate::domain::error::DomainError;

impl OrgAuthService {
    /// Invite a teammate: INVITED global projection, regional projection,
    /// region-prefixed invitation token and invitation email. The regional
    /// step packs user + token + email into one transaction; its failure
    /// compensates by deleting the global projection.
    ///
    /// # Errors
    /// `Conflict` when the address already belongs to this employer.
    pub async fn invite_user(&self, ctx: &OrgContext, email: &str) -> Result<(), DomainError> {
        email_domain(email)?;
        let email_hash = token::hash_email(email);
        if org_users::find_by_email_hash(self.global.conn(), &email_hash, ctx.employer_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("user already exists at this employer"));
        }

        let user_id = Uuid::new_v4();
        let invitation_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.org_invitation);
        let regional_db = self.regional(&ctx.region)?;

        let mut saga: Saga<DomainError> = Saga::new("org_invite_user");

        saga.run_with_undo(
            "create_global_projection",
            async {
                org_users::create(
                    self.global.conn(),
                    NewGlobalOrgUser {
                        id: user_id,
                        email_hash: &email_hash,
                        employer_id: ctx.employer_id,
                        home_region: ctx.region.as_str(),
                        status: UserStatus::Invited,
                        preferred_language: &self.cfg.default_language,
                        full_name: None,
                    },
                )
                .await
                .map_err(DomainError::from)
            },
            {
                let global = self.global.clone();
                move || async move {
                    org_users::delete(global.conn(), user_id)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        let wire_token = token::prefixed(&ctx.region, &invitation_token);
        let mail = emails::org_invitation(&self.cfg.ui_urls.org, &ctx.employer_name, &wire_token);
        saga.run("create_regional_invitation", {
            let email = email.to_owned();
            let employer_id = ctx.employer_id;
            let bare = invitation_token.clone();
            regional_db.with_tx(move |tx| {
                Box::pin(async move {
                    regional_users::create(
                        tx,
                        NewRegionalOrgUser {
                            id: user_id,
                            email: &email,
                            password_hash: None,
                            is_admin: false,
                            employer_id,
                            status: UserStatus::Invited,
                            full_name: None,
                        },
                    )
                    .await?;
                    tokens::create_org_token(
                        tx,
                        &bare,
                        TokenKind::Invitation,
                        user_id,
                        None,
                        expires_at,
                    )
                    .await?;
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::OrgInvitation,
                            to_addr: &email,
                            subject: &mail.subject,
                            text_body: &mail.text_body,
                            html_body: &mail.html_body,
                        },
                    )
                    .await
                    .map_err(DomainError::from)
                })
            })
        })
        .await?;

        saga.commit();
        tracing::info!(employer_id = %ctx.employer_id, "teammate invited");
        Ok(())
    }

    /// Complete an invitation. Regional projection first (password, name),
    /// then the global projection (status, profile), then the single-use
    /// token delete; a crash between the steps leaves the token alive and
    /// the whole flow retryable.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired tokens, `Conflict` when the
    /// invitation was already completed.
    pub async fn complete_invite(
        &self,
        region: &RegionCode,
        bare_token: &str,
        full_name: &str,
        password: &str,
        preferred_language: Option<&str>,
    ) -> Result<(), DomainError> {
        let regional_db = self.regional(region)?;
        let row = tokens::find_org_token(regional_db.conn(), bare_token, TokenKind::Invitation)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let global_user = org_users::find(self.global.conn(), row.org_user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if global_user.status != UserStatus::Invited {
            return Err(DomainError::conflict("invitation already completed"));
        }

        validate_full_name(full_name)?;
        validate_password(password)?;
        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user_id = row.org_user_id;
        {
            let full_name = full_name.to_owned();
            regional_db
                .with_tx(move |tx| {
                    Box::pin(async move {
                        regional_users::activate(tx, user_id, &full_name, &password_hash)
                            .await
                            .map_err(DomainError::from)
                    })
                })
                .await?;
        }

        let language = preferred_language.unwrap_or(&self.cfg.default_language);
        org_users::activate(self.global.conn(), user_id, full_name, language).await?;

        tokens::delete_org_token(regional_db.conn(), bare_token).await?;
        Ok(())
    }
}
