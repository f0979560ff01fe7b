use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Lifetimes for every token kind the core mints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenExpiries {
    #[serde(with = "humantime_serde")]
    pub org_session: Duration,
    #[serde(with = "humantime_serde")]
    pub org_remember_me: Duration,
    #[serde(with = "humantime_serde")]
    pub org_tfa: Duration,
    #[serde(with = "humantime_serde")]
    pub org_signup: Duration,
    #[serde(with = "humantime_serde")]
    pub org_invitation: Duration,
    #[serde(with = "humantime_serde")]
    pub org_password_reset: Duration,
    #[serde(with = "humantime_serde")]
    pub admin_session: Duration,
    #[serde(with = "humantime_serde")]
    pub admin_tfa: Duration,
    #[serde(with = "humantime_serde")]
    pub admin_invitation: Duration,
    #[serde(with = "humantime_serde")]
    pub admin_password_reset: Duration,
}

impl Default for TokenExpiries {
    fn default() -> Self {
        Self {
            org_session: Duration::from_secs(12 * 60 * 60),
            org_remember_me: Duration::from_secs(30 * 24 * 60 * 60),
            org_tfa: Duration::from_secs(10 * 60),
            org_signup: Duration::from_secs(24 * 60 * 60),
            org_invitation: Duration::from_secs(7 * 24 * 60 * 60),
            org_password_reset: Duration::from_secs(60 * 60),
            admin_session: Duration::from_secs(12 * 60 * 60),
            admin_tfa: Duration::from_secs(10 * 60),
            admin_invitation: Duration::from_secs(7 * 24 * 60 * 60),
            admin_password_reset: Duration::from_secs(60 * 60),
        }
    }
}

/// Base URLs of the two user-facing portals, used in email links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiUrls {
    pub admin: Url,
    pub org: Url,
}

impl Default for UiUrls {
    fn default() -> Self {
        Self {
            admin: Url::parse("http://localhost:3001").expect("static URL"),
            org: Url::parse("http://localhost:3000").expect("static URL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub token_expiries: TokenExpiries,

    /// Known personal-email providers; signup rejects addresses at these
    /// domains, case-insensitively.
    pub personal_email_domains: Vec<String>,

    pub ui_urls: UiUrls,

    /// Fallback for users who have not chosen a language yet.
    pub default_language: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_expiries: TokenExpiries::default(),
            personal_email_domains: default_personal_email_domains(),
            ui_urls: UiUrls::default(),
            default_language: "en".to_owned(),
        }
    }
}

impl IdentityConfig {
    #[must_use]
    pub fn is_personal_email_domain(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.personal_email_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&domain))
    }
}

fn default_personal_email_domains() -> Vec<String> {
    [
        "gmail.com",
        "googlemail.com",
        "yahoo.com",
        "ymail.com",
        "rocketmail.com",
        "hotmail.com",
        "outlook.com",
        "live.com",
        "msn.com",
        "aol.com",
        "icloud.com",
        "me.com",
        "mac.com",
        "protonmail.com",
        "proton.me",
        "pm.me",
        "zoho.com",
        "yandex.com",
        "yandex.ru",
        "mail.com",
        "mail.ru",
        "gmx.com",
        "gmx.de",
        "web.de",
        "qq.com",
        "163.com",
        "126.com",
        "sina.com",
        "rediffmail.com",
        "fastmail.com",
        "hushmail.com",
        "tutanota.com",
        "tutamail.com",
        "hey.com",
        "inbox.com",
        "naver.com",
        "daum.net",
        "hanmail.net",
        "seznam.cz",
        "wp.pl",
        "libero.it",
        "orange.fr",
        "wanadoo.fr",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

/// Convert a configured std duration into the chrono form used for
/// `expires_at` arithmetic.
#[must_use]
pub fn chrono_ttl(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::days(365))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_domain_check_is_case_insensitive() {
        let cfg = IdentityConfig::default();
        assert!(cfg.is_personal_email_domain("gmail.com"));
        assert!(cfg.is_personal_email_domain("GMail.Com"));
        assert!(!cfg.is_personal_email_domain("acme.test"));
    }
}
