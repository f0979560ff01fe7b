//! Org signup: init (email + home region) and completion (DNS-gated
//! employer bootstrap).

use chrono::Utc;
use uuid::Uuid;
use vetchium_federation::{token, RegionCode, Saga};
use vetchium_store::global::org_users::NewGlobalOrgUser;
use vetchium_store::global::{employers, org_users, tokens as global_tokens};
use vetchium_store::regional::employer_domains::NewRegionalDomain;
use vetchium_store::regional::org_users::NewRegionalOrgUser;
use vetchium_store::regional::outbox::NewEmail;
use vetchium_store::regional::{employer_domains, org_users as regional_users, outbox, tokens};
use vetchium_store::types::{roles, DomainStatus, EmailKind, UserStatus};

use super::{email_domain, validate_password, OrgAuthService, TokenGrant};
use crate::config::chrono_ttl;
use crate::domain::emails;
use crate::domain::error::DomainError;

impl OrgAuthService {
    /// Start a signup: validate the address, reject personal-email
    /// providers and already-registered addresses, then persist the signup
    /// token and enqueue the verification email in the chosen home region.
    ///
    /// The token is also the DNS TXT value the applicant must publish at
    /// `_vetchium-verify.<domain>`.
    ///
    /// # Errors
    /// Validation errors for bad input, `Conflict` when the address already
    /// owns an org account.
    pub async fn init_signup(&self, email: &str, home_region: &str) -> Result<(), DomainError> {
        let domain = email_domain(email)?;
        let region = RegionCode::parse(home_region)?;
        if !self.registry.is_known(&region) {
            return Err(DomainError::validation(
                "home_region",
                format!("unknown region: {home_region}"),
            ));
        }
        if self.cfg.is_personal_email_domain(&domain) {
            return Err(DomainError::validation(
                "email",
                "personal email providers cannot sign up as employers",
            ));
        }

        let email_hash = token::hash_email(email);
        if org_users::find_any_by_email_hash(self.global.conn(), &email_hash)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("email is already registered"));
        }

        let signup_token = token::generate();
        let expires_at = Utc::now() + chrono_ttl(self.cfg.token_expiries.org_signup);
        let regional_db = self.regional(&region)?;

        let mut saga: Saga<DomainError> = Saga::new("org_init_signup");

        saga.run_with_undo(
            "create_signup_token",
            async {
                global_tokens::create_signup_token(
                    self.global.conn(),
                    &signup_token,
                    email,
                    region.as_str(),
                    expires_at,
                )
                .await
                .map_err(DomainError::from)
            },
            {
                let global = self.global.clone();
                let signup_token = signup_token.clone();
                move || async move {
                    global_tokens::delete_signup_token(global.conn(), &signup_token)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        let mail = emails::signup_verification(
            &self.cfg.ui_urls.org,
            email,
            &domain,
            &signup_token,
        );
        let to_addr = email.to_owned();
        saga.run(
            "enqueue_verification_email",
            regional_db.with_tx(move |tx| {
                Box::pin(async move {
                    outbox::enqueue(
                        tx,
                        NewEmail {
                            email_type: EmailKind::OrgSignupVerification,
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

    /// The home region a signup token was issued for. Handlers use this to
    /// decide whether to proxy completion to a peer node.
    ///
    /// # Errors
    /// `Unauthorized` for unknown or expired tokens.
    pub async fn signup_token_region(&self, signup_token: &str) -> Result<RegionCode, DomainError> {
        let row = global_tokens::find_signup_token(self.global.conn(), signup_token)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        RegionCode::parse(&row.region).map_err(|_| DomainError::Unauthorized)
    }

    /// Complete a signup: require the DNS TXT proof, create the employer
    /// with its routing record and global user in one global transaction,
    /// then the regional projections and first session in one regional
    /// transaction. The regional failure path compensates by deleting the
    /// employer, which cascades through everything the global transaction
    /// created.
    ///
    /// # Errors
    /// `Unauthorized` for unknown/expired/consumed tokens, `InvalidState`
    /// when the TXT proof is missing, `Conflict` when the domain or address
    /// was claimed concurrently.
    pub async fn complete_signup(
        &self,
        signup_token: &str,
        password: &str,
        preferred_language: Option<&str>,
    ) -> Result<TokenGrant, DomainError> {
        let row = global_tokens::find_signup_token(self.global.conn(), signup_token)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let region = RegionCode::parse(&row.region).map_err(|_| DomainError::Unauthorized)?;
        validate_password(password)?;
        let domain = email_domain(&row.email)?;

        if !self.verification.txt_matches(&domain, &row.token).await {
            return Err(DomainError::invalid_state("domain verification failed"));
        }

        let employer_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let language = preferred_language
            .unwrap_or(&self.cfg.default_language)
            .to_owned();
        let regional_db = self.regional(&region)?;
        let now = Utc::now();

        let mut saga: Saga<DomainError> = Saga::new("org_complete_signup");

        // Employer, routing record and global projection commit or roll
        // back together; the saga-level compensator only exists for the
        // regional step below.
        saga.run_with_undo(
            "create_global_identity",
            {
                let domain = domain.clone();
                let email_hash = token::hash_email(&row.email);
                let region_code = region.as_str().to_owned();
                let language = language.clone();
                self.global.with_tx(move |tx| {
                    Box::pin(async move {
                        employers::create(tx, employer_id, &domain, &region_code).await?;
                        employers::create_domain(
                            tx,
                            &domain,
                            employer_id,
                            &region_code,
                            DomainStatus::Verified,
                        )
                        .await?;
                        org_users::create(
                            tx,
                            NewGlobalOrgUser {
                                id: user_id,
                                email_hash: &email_hash,
                                employer_id,
                                home_region: &region_code,
                                status: UserStatus::Active,
                                preferred_language: &language,
                                full_name: None,
                            },
                        )
                        .await?;
                        Ok(())
                    })
                })
            },
            {
                let global = self.global.clone();
                move || async move {
                    employers::delete(global.conn(), employer_id)
                        .await
                        .map_err(DomainError::from)
                }
            },
        )
        .await?;

        // Expensive work stays outside both transactions.
        let password_hash = saga
            .run("hash_password", async {
                bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(DomainError::from)
            })
            .await?;

        let session_token = token::generate();
        let session_expires = now + chrono_ttl(self.cfg.token_expiries.org_session);

        saga.run("create_regional_identity", {
            let email = row.email.clone();
            let domain = domain.clone();
            let proof = row.token.clone();
            let session = session_token.clone();
            regional_db.with_tx(move |tx| {
                Box::pin(async move {
                    regional_users::create(
                        tx,
                        NewRegionalOrgUser {
                            id: user_id,
                            email: &email,
                            password_hash: Some(&password_hash),
                            is_admin: true,
                            employer_id,
                            status: UserStatus::Active,
                            full_name: None,
                        },
                    )
                    .await?;
                    employer_domains::create(
                        tx,
                        NewRegionalDomain {
                            employer_id,
                            domain: &domain,
                            verification_token: &proof,
                            token_expires_at: now + chrono::Duration::days(30),
                            status: DomainStatus::Verified,
                            last_verified_at: Some(now),
                        },
                    )
                    .await?;
                    regional_users::add_role(tx, user_id, roles::EMPLOYER_SUPERADMIN).await?;
                    tokens::create_session(tx, &session, user_id, session_expires).await?;
                    Ok(())
                })
            })
        })
        .await?;

        saga.commit();

        // Best-effort: a leftover signup token is harmless, the unique
        // employer and domain rows turn any replay into a 409.
        if let Err(e) =
            global_tokens::delete_signup_token(self.global.conn(), signup_token).await
        {
            tracing::warn!(error = %e, "failed to consume signup token");
        }

        tracing::info!(employer_id = %employer_id, domain, "employer signup completed");
        Ok(TokenGrant {
            token: token::prefixed(&region, &session_token),
            expires_at: session_expires,
        })
    }
}
