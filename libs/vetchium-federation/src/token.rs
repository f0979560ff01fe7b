//! Opaque tokens and the region-prefix wire grammar.
//!
//! Wire forms:
//! - region-prefixed: `^[A-Z]{3}\d-[a-f0-9]{64}$` (org session / TFA /
//!   invitation / password-reset tokens)
//! - bare: `^[a-f0-9]{64}$` (signup tokens and everything on the admin plane)
//!
//! The stored form is always the bare hex: the prefix is routing metadata
//! only, and keeping it out of the database means a dump does not reveal
//! topology. Parsing is strict; nothing ever defaults to the local region.

use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::regions::{RegionCode, RegionRegistry};

/// Length of the bare hex form: 32 random bytes, hex-encoded.
pub const BARE_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is missing its region prefix")]
    MissingPrefix,

    #[error("token does not match the expected format")]
    InvalidFormat,

    #[error("token region is not known: {0}")]
    UnknownRegion(String),
}

/// Generate a fresh bare token: 256 bits from a CSPRNG, hex-encoded.
#[must_use]
pub fn generate() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a 6-digit TFA code.
#[must_use]
pub fn tfa_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Constant-time comparison for TFA codes.
#[must_use]
pub fn code_matches(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Render the wire form for a region-owned token.
#[must_use]
pub fn prefixed(region: &RegionCode, bare: &str) -> String {
    format!("{}-{}", region.wire_prefix(), bare)
}

/// True iff `s` is a well-formed bare token.
#[must_use]
pub fn is_bare(s: &str) -> bool {
    s.len() == BARE_LEN
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Parse a region-prefixed wire token into its owning region and bare form.
///
/// # Errors
/// - `MissingPrefix` when the token has no prefix separator (a bare token
///   was presented where a prefixed one is required).
/// - `InvalidFormat` when either half violates the grammar.
/// - `UnknownRegion` when the prefix names a region this deployment does
///   not know.
pub fn parse_prefixed(
    wire: &str,
    registry: &RegionRegistry,
) -> Result<(RegionCode, String), TokenError> {
    let Some((prefix, bare)) = wire.split_once('-') else {
        return Err(TokenError::MissingPrefix);
    };

    let prefix_bytes = prefix.as_bytes();
    let prefix_ok = prefix_bytes.len() == 4
        && prefix_bytes[..3].iter().all(u8::is_ascii_uppercase)
        && prefix_bytes[3].is_ascii_digit();
    if !prefix_ok || !is_bare(bare) {
        return Err(TokenError::InvalidFormat);
    }

    let region =
        RegionCode::parse(prefix).map_err(|_| TokenError::UnknownRegion(prefix.to_owned()))?;
    if !registry.is_known(&region) {
        return Err(TokenError::UnknownRegion(prefix.to_owned()));
    }
    Ok((region, bare.to_owned()))
}

/// Hash an email address for global org-user identity: SHA-256 over the
/// lowercased UTF-8 bytes, hex-encoded. Admin logins keep plaintext email;
/// only org users hash, because the same person may exist at two employers.
#[must_use]
pub fn hash_email(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RegionHandle;
    use std::collections::HashMap;
    use url::Url;

    async fn registry() -> RegionRegistry {
        let mut regions = HashMap::new();
        for code in ["ind1", "usa1"] {
            let db = vetchium_db::Db::connect("sqlite::memory:", vetchium_db::ConnectOpts::default())
                .await
                .unwrap();
            regions.insert(
                RegionCode::parse(code).unwrap(),
                RegionHandle {
                    db,
                    base_url: Url::parse(&format!("http://{code}.internal:8080")).unwrap(),
                },
            );
        }
        RegionRegistry::new(RegionCode::parse("ind1").unwrap(), regions).unwrap()
    }

    #[test]
    fn generates_64_hex_chars() {
        let t = generate();
        assert_eq!(t.len(), BARE_LEN);
        assert!(is_bare(&t));
        assert_ne!(t, generate());
    }

    #[tokio::test]
    async fn prefixed_tokens_round_trip() {
        let registry = registry().await;
        let region = RegionCode::parse("usa1").unwrap();
        let bare = generate();
        let wire = prefixed(&region, &bare);
        assert!(wire.starts_with("USA1-"));

        let (parsed_region, parsed_bare) = parse_prefixed(&wire, &registry).unwrap();
        assert_eq!(parsed_region, region);
        assert_eq!(parsed_bare, bare);
    }

    #[tokio::test]
    async fn parse_rejects_bare_and_malformed_and_unknown() {
        let registry = registry().await;
        let bare = generate();

        assert_eq!(
            parse_prefixed(&bare, &registry).unwrap_err(),
            TokenError::MissingPrefix
        );
        assert_eq!(
            parse_prefixed(&format!("ind1-{bare}"), &registry).unwrap_err(),
            TokenError::InvalidFormat
        );
        assert_eq!(
            parse_prefixed("IND1-abc", &registry).unwrap_err(),
            TokenError::InvalidFormat
        );
        assert_eq!(
            parse_prefixed(&format!("IND1-{}", bare.to_uppercase()), &registry).unwrap_err(),
            TokenError::InvalidFormat
        );
        assert_eq!(
            parse_prefixed(&format!("DEU1-{bare}"), &registry).unwrap_err(),
            TokenError::UnknownRegion("DEU1".to_owned())
        );
    }

    #[test]
    fn email_hash_is_case_insensitive() {
        assert_eq!(hash_email("Founder@Acme.Test"), hash_email("founder@acme.test"));
        assert_ne!(hash_email("a@acme.test"), hash_email("b@acme.test"));
        assert_eq!(hash_email("founder@acme.test").len(), 64);
    }

    #[test]
    fn tfa_codes_are_six_digits_and_compared_in_constant_time() {
        let code = tfa_code();
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert!(code_matches("123456", "123456"));
        assert!(!code_matches("123456", "000000"));
        assert!(!code_matches("123456", "12345"));
    }
}
