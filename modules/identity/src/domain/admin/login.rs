//! Admin login, TFA and logout.

use chrono::Utc;
use vetchium_federation::token;
use vetchium_store::global::{admin_users, tokens};
use vetchium_store::regional::outbox::{self, NewEmail};
use vetchium_store::types::{EmailKind, TokenKind, UserStatus};

use super::AdminAuthService;
use crate::config::chrono_ttl;
use crate::domain::context::AdminContext;
use crate::domain::emails;
use crate::domain::error::DomainError;
use crate::domain::org::TokenGrant;
use vetchium_federation::Saga;

impl AdminAuthService {
    /// Password login for administrators. Requires status ACTIVE. Returns a
    /// bare TFA token; the code travels by email through the local region's
    /// outbox.
    ///
    /// # Errors
    /// `Unauthorized` for unknown admins or wrong passwords, `InvalidState`
    /// for non-ACTIVE accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenGrant, DomainError> {
        let admin = admin_users::find_by_email(self.global.conn(), &email.to_ascii_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if admin.status != UserStatus::Active {
            return Err(DomainError::invalid_state("admin account is not active"));
        }
        let password_hash = admin
            .password_hash
            .as_deref()
            .ok_or(DomainError::Unauthorized)?;
        if !bcrypt::verify(password, password_hash)? {
            return Err(DomainError::Unauthorized);
        }

        let code = token::tfa_code();
        let tfa_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.admin_tfa);
        let mail = emails::tfa_code(&code, &admin.preferred_language);

        // The token lives globally, the email regionally; the saga deletes
        // the token when the enqueue fails.
        let mut saga: Saga<DomainError> = Saga::new("admin_login");
        saga.run_with_undo(
            "create_tfa_token",
            async {
                tokens::create_admin_token(
                    self.global.conn(),
                    &tfa_token,
                    TokenKind::Tfa,
                    admin.id,
                    Some(&code),
                    expires_at,
                )
                .await
                .map_err(DomainError::from)
            },
            {
                let global = self.global.clone();
                let tfa_token = tfa_token.clone();
                move || async move {
                    tokens::delete_admin_token(global.conn(), &tfa_token)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        let to_addr = admin.email.clone();
        saga.run(
            "enqueue_tfa_email",
            self.registry.local_db().with_tx(move |tx| {
                Box::pin(async move {
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::AdminTfa,
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
        Ok(TokenGrant {
            token: tfa_token,
            expires_at,
        })
    }

    /// Exchange TFA token + code for an admin session. As on the org plane,
    /// the TFA token is left to expire so a lost response stays retryable.
    ///
    /// # Errors
    /// `Unauthorized` for unknown tokens, `WrongTfaCode` on mismatch.
    pub async fn verify_tfa(
        &self,
        tfa_token: &str,
        tfa_code: &str,
    ) -> Result<TokenGrant, DomainError> {
        let row = tokens::find_admin_token(self.global.conn(), tfa_token, TokenKind::Tfa)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let expected = row.tfa_code.as_deref().ok_or(DomainError::Unauthorized)?;
        if !token::code_matches(expected, tfa_code) {
            return Err(DomainError::WrongTfaCode);
        }

        let session_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.admin_session);
        tokens::create_admin_session(self.global.conn(), &session_token, row.admin_user_id, expires_at)
            .await?;

        Ok(TokenGrant {
            token: session_token,
            expires_at,
        })
    }

    /// # Errors
    /// Infrastructure errors only.
    pub async fn logout(&self, ctx: &AdminContext) -> Result<(), DomainError> {
        tokens::delete_admin_session(self.global.conn(), &ctx.session_token).await?;
        Ok(())
    }
}
