//! Org login, TFA verification and logout.

use chrono::Utc;
use vetchium_federation::{token, RegionCode};
use vetchium_store::global::{employers, org_users};
use vetchium_store::regional::outbox::NewEmail;
use vetchium_store::regional::{org_users as regional_users, outbox, tokens};
use vetchium_store::types::{DomainStatus, EmailKind, TokenKind, UserStatus};

use super::{OrgAuthService, TokenGrant};
use crate::config::chrono_ttl;
use crate::domain::context::OrgContext;
use crate::domain::emails;
use crate::domain::error::DomainError;

impl OrgAuthService {
    /// Password login against a verified employer domain. On success a TFA
    /// code is emailed and a region-prefixed TFA token returned; no session
    /// exists yet.
    ///
    /// # Errors
    /// `Unauthorized` for unknown domain/user or a wrong password,
    /// `InvalidState` for unverified domains and disabled users.
    pub async fn login(
        &self,
        email: &str,
        domain: &str,
        password: &str,
    ) -> Result<TokenGrant, DomainError> {
        let routing = employers::find_domain(self.global.conn(), &domain.to_ascii_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if routing.status != DomainStatus::Verified {
            return Err(DomainError::invalid_state("domain is not verified"));
        }
        let region = RegionCode::parse(&routing.region)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let email_hash = token::hash_email(email);
        let global_user =
            org_users::find_by_email_hash(self.global.conn(), &email_hash, routing.employer_id)
                .await?
                .ok_or(DomainError::Unauthorized)?;
        if global_user.status == UserStatus::Disabled {
            return Err(DomainError::invalid_state("user is disabled"));
        }

        let regional_db = self.regional(&region)?;
        let regional_user = regional_users::find(regional_db.conn(), global_user.id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let password_hash = regional_user
            .password_hash
            .as_deref()
            .ok_or(DomainError::Unauthorized)?;
        if !bcrypt::verify(password, password_hash)? {
            return Err(DomainError::Unauthorized);
        }

        let code = token::tfa_code();
        let tfa_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.org_tfa);
        let mail = emails::tfa_code(&code, &global_user.preferred_language);

        // Token and email land in one regional transaction: either both
        // exist or neither does.
        let user_id = global_user.id;
        let to_addr = regional_user.email.clone();
        let bare = tfa_token.clone();
        regional_db
            .with_tx(move |tx| {
                Box::pin(async move {
                    tokens::create_org_token(
                        tx,
                        &bare,
                        TokenKind::Tfa,
                        user_id,
                        Some(&code),
                        expires_at,
                    )
                    .await?;
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::OrgTfa,
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

        Ok(TokenGrant {
            token: token::prefixed(&region, &tfa_token),
            expires_at,
        })
    }

    /// Exchange a TFA token plus code for a session. The TFA token is left
    /// to expire naturally: a client that lost the response can retry, and
    /// reuse merely mints another session for the already-authenticated
    /// principal.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired TFA tokens, `WrongTfaCode` on a
    /// code mismatch.
    pub async fn verify_tfa(
        &self,
        region: &RegionCode,
        bare_token: &str,
        tfa_code: &str,
        remember_me: bool,
    ) -> Result<TokenGrant, DomainError> {
        let regional_db = self.regional(region)?;
        let row = tokens::find_org_token(regional_db.conn(), bare_token, TokenKind::Tfa)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let expected = row.tfa_code.as_deref().ok_or(DomainError::Unauthorized)?;
        if !token::code_matches(expected, tfa_code) {
            return Err(DomainError::WrongTfaCode);
        }

        let ttl = if remember_me {
            self.cfg.token_expiries.org_remember_me
        } else {
            self.cfg.token_expiries.org_session
        };
        let session_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(ttl);
        tokens::create_session(regional_db.conn(), &session_token, row.org_user_id, expires_at)
            .await?;

        Ok(TokenGrant {
            token: token::prefixed(region, &session_token),
            expires_at,
        })
    }

    /// Delete the presented session.
    ///
    /// # Errors
    /// Infrastructure errors only; logging out twice is a no-op.
    pub async fn logout(&self, ctx: &OrgContext) -> Result<(), DomainError> {
        let regional_db = self.regional(&ctx.region)?;
        tokens::delete_session(regional_db.conn(), &ctx.session_token).await?;
        Ok(())
    }
}
