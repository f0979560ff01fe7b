//! Domain-ownership verification.
//!
//! DNS ownership of a domain is the only evidence the platform accepts for
//! employer identity. This module issues per-domain proof tokens, performs
//! the TXT lookups and drives the PENDING / VERIFIED / FAILING state machine.
//! The REST surface for claim/verify lives with the rest of the org routes
//! in the identity module; this crate exposes the service and the resolver
//! seam.

pub mod config;
pub mod domain;
pub mod infra;

pub use config::VerificationConfig;
pub use domain::error::VerificationError;
pub use domain::service::DomainVerificationService;
pub use infra::dns::{DnsError, HickoryTxtResolver, StaticTxtResolver, TxtResolver};

/// Host prefix under which applicants publish their proof token.
pub const VERIFICATION_HOST_PREFIX: &str = "_vetchium-verify";

/// The TXT record host for a domain, e.g. `_vetchium-verify.acme.test`.
#[must_use]
pub fn record_host(domain: &str) -> String {
    format!("{VERIFICATION_HOST_PREFIX}.{domain}")
}
