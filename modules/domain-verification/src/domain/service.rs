use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vetchium_db::Db;
use vetchium_federation::{token, RegionCode, RegionRegistry, Saga};
use vetchium_store::global::employers;
use vetchium_store::regional::employer_domains::{self, NewRegionalDomain};
use vetchium_store::types::DomainStatus;

use super::error::VerificationError;
use crate::config::VerificationConfig;
use crate::infra::dns::TxtResolver;
use crate::record_host;

/// Result of a successful claim: the proof token the applicant must publish
/// at `_vetchium-verify.<domain>` and its expiry.
#[derive(Debug)]
pub struct ClaimOutcome {
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
}

/// Drives the per-(employer, domain) verification state machine.
pub struct DomainVerificationService {
    global: Db,
    registry: Arc<RegionRegistry>,
    resolver: Arc<dyn TxtResolver>,
    cfg: VerificationConfig,
}

/// One row of the transition table: given the current state and counter and
/// the lookup outcome, produce the next state and counter. A VERIFIED domain
/// only degrades to FAILING once the consecutive-failure threshold is
/// reached; `last_verified_at` is never touched on the failure path.
fn transition(
    status: DomainStatus,
    consecutive_failures: i32,
    lookup_ok: bool,
    max_failures: i32,
) -> (DomainStatus, i32) {
    if lookup_ok {
        return (DomainStatus::Verified, 0);
    }
    let failures = consecutive_failures + 1;
    let next = match status {
        DomainStatus::Pending => DomainStatus::Pending,
        DomainStatus::Verified if failures >= max_failures => DomainStatus::Failing,
        DomainStatus::Verified => DomainStatus::Verified,
        DomainStatus::Failing => DomainStatus::Failing,
    };
    (next, failures)
}

impl DomainVerificationService {
    pub fn new(
        global: Db,
        registry: Arc<RegionRegistry>,
        resolver: Arc<dyn TxtResolver>,
        cfg: VerificationConfig,
    ) -> Self {
        Self {
            global,
            registry,
            resolver,
            cfg,
        }
    }

    /// The resolver seam, shared with signup completion (which checks the
    /// signup token as a TXT proof before any row exists).
    #[must_use]
    pub fn resolver(&self) -> Arc<dyn TxtResolver> {
        Arc::clone(&self.resolver)
    }

    /// Whether `domain` publishes `token` in a TXT record at the
    /// verification host. Records are compared exactly after trimming
    /// surrounding quotes. Resolver errors count as a mismatch; transient
    /// DNS trouble must degrade to "retry later", never to implicit
    /// verification.
    pub async fn txt_matches(&self, domain: &str, expected: &str) -> bool {
        if self.cfg.dev_mode && domain == "example.com" {
            return true;
        }
        let host = record_host(domain);
        match self.resolver.txt(&host).await {
            Ok(records) => records.iter().any(|r| r.trim_matches('"') == expected),
            Err(e) => {
                tracing::debug!(host = %host, error = %e, "TXT lookup failed");
                false
            }
        }
    }

    /// Claim a domain for an employer: create the global routing record
    /// (PENDING) and the regional verification record with a fresh proof
    /// token. Global-first with a compensating delete, so a regional
    /// failure leaves nothing behind.
    ///
    /// # Errors
    /// `AlreadyClaimed` when the domain has a routing record (here or at
    /// another employer); `Region` for unknown regions; `Db` otherwise.
    pub async fn claim(
        &self,
        region: &RegionCode,
        employer_id: Uuid,
        domain: &str,
    ) -> Result<ClaimOutcome, VerificationError> {
        let regional = self.registry.db(region)?.clone();
        let verification_token = token::generate();
        let token_expires_at = Utc::now()
            + chrono::Duration::from_std(self.cfg.token_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(30));

        let mut saga: Saga<VerificationError> = Saga::new("claim_domain");

        saga.run_with_undo(
            "create_global_domain",
            async {
                employers::create_domain(
                    self.global.conn(),
                    domain,
                    employer_id,
                    region.as_str(),
                    DomainStatus::Pending,
                )
                .await
                .map_err(VerificationError::from)
            },
            {
                let global = self.global.clone();
                let domain = domain.to_owned();
                move || async move {
                    employers::delete_domain(global.conn(), &domain)
                        .await
                        .map_err(VerificationError::from)
                }
            },
        )
        .await?;

        let claimed_domain = domain.to_owned();
        let proof = verification_token.clone();
        saga.run(
            "create_regional_domain",
            regional.with_tx(move |tx| {
                Box::pin(async move {
                    employer_domains::create(
                        tx,
                        NewRegionalDomain {
                            employer_id,
                            domain: &claimed_domain,
                            verification_token: &proof,
                            token_expires_at,
                            status: DomainStatus::Pending,
                            last_verified_at: None,
                        },
                    )
                    .await
                    .map_err(VerificationError::from)
                })
            }),
        )
        .await?;

        saga.commit();
        Ok(ClaimOutcome {
            verification_token,
            token_expires_at,
        })
    }

    /// Run one verification pass for an existing claim and apply the state
    /// transition. An expired proof token fails without a lookup.
    ///
    /// # Errors
    /// `NotFound` when no claim exists for (employer, domain); `Db` on
    /// infrastructure failure.
    pub async fn verify(
        &self,
        region: &RegionCode,
        employer_id: Uuid,
        domain: &str,
    ) -> Result<DomainStatus, VerificationError> {
        let regional = self.registry.db(region)?;
        let row = employer_domains::find(regional.conn(), employer_id, domain)
            .await?
            .ok_or(VerificationError::NotFound)?;

        let now = Utc::now();
        let lookup_ok = row.token_expires_at > now
            && self.txt_matches(domain, &row.verification_token).await;

        let (next, failures) = transition(
            row.status,
            row.consecutive_failures,
            lookup_ok,
            self.cfg.max_consecutive_failures,
        );

        if lookup_ok {
            employer_domains::mark_verified(regional.conn(), employer_id, domain, now).await?;
            if row.status != DomainStatus::Verified {
                employers::set_domain_status(self.global.conn(), domain, DomainStatus::Verified)
                    .await?;
            }
            tracing::info!(domain, employer_id = %employer_id, "domain verified");
        } else {
            employer_domains::mark_failed(regional.conn(), employer_id, domain, next, failures)
                .await?;
            tracing::info!(
                domain,
                employer_id = %employer_id,
                consecutive_failures = failures,
                status = ?next,
                "domain verification failed"
            );
        }
        Ok(next)
    }
}
