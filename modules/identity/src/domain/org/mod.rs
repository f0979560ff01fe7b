//! Org-plane authentication service.
//!
//! Flows are split by lifecycle: signup, login/TFA, invitations, password
//! reset and user administration. Everything region-affine goes through the
//! registry; the service never assumes it runs in the caller's home region.

mod invite;
mod login;
mod password_reset;
mod signup;
mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use vetchium_db::Db;
use vetchium_domain_verification::DomainVerificationService;
use vetchium_federation::{RegionCode, RegionRegistry};

use super::error::DomainError;
use crate::config::IdentityConfig;

pub struct OrgAuthService {
    pub(crate) global: Db,
    pub(crate) registry: Arc<RegionRegistry>,
    pub(crate) verification: Arc<DomainVerificationService>,
    pub(crate) cfg: Arc<IdentityConfig>,
}

/// A minted token in wire form plus its expiry.
#[derive(Debug)]
pub struct TokenGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl OrgAuthService {
    pub fn new(
        global: Db,
        registry: Arc<RegionRegistry>,
        verification: Arc<DomainVerificationService>,
        cfg: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            global,
            registry,
            verification,
            cfg,
        }
    }

    pub(crate) fn regional(&self, region: &RegionCode) -> Result<&Db, DomainError> {
        self.registry
            .db(region)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}

/// Split and lightly validate an email address; returns the lowercased
/// domain part.
pub(crate) fn email_domain(email: &str) -> Result<String, DomainError> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| DomainError::validation("email", "not a valid email address"))?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains(' ') {
        return Err(DomainError::validation("email", "not a valid email address"));
    }
    Ok(domain.to_ascii_lowercase())
}

pub(crate) fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.len() < 12 {
        return Err(DomainError::validation(
            "password",
            "must be at least 12 characters",
        ));
    }
    if password.len() > 128 {
        return Err(DomainError::validation(
            "password",
            "must be at most 128 characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_full_name(full_name: &str) -> Result<(), DomainError> {
    if full_name.trim().is_empty() {
        return Err(DomainError::validation("full_name", "must not be empty"));
    }
    if full_name.len() > 256 {
        return Err(DomainError::validation(
            "full_name",
            "must be at most 256 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn email_domain_is_lowercased() {
        assert_eq!(email_domain("Founder@Acme.Test").unwrap(), "acme.test");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "founder", "@acme.test", "founder@", "a@b", "a@has space.test"] {
            assert!(email_domain(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("Hunter22Hunter22!").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
