use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the verification engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Per-lookup DNS deadline.
    #[serde(with = "humantime_serde")]
    pub dns_timeout: Duration,

    /// Consecutive failures after which a VERIFIED domain degrades to
    /// FAILING.
    pub max_consecutive_failures: i32,

    /// Lifetime of a claim's verification token.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Development mode: whitelists `example.com` so local stacks can
    /// complete signup without publishing real DNS records.
    pub dev_mode: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            dns_timeout: Duration::from_secs(5),
            max_consecutive_failures: 3,
            token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            dev_mode: false,
        }
    }
}
