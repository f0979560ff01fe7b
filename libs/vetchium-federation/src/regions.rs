//! Region registry: process-wide immutable map after boot.
//!
//! Operators restart nodes to change topology; there is no dynamic
//! add/remove. Every request resolves its target region through this
//! registry, either from configuration (`current`) or from a token prefix.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use vetchium_db::Db;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("invalid region code: {0}")]
    InvalidCode(String),

    #[error("unknown region: {0}")]
    Unknown(String),
}

/// A validated region code: three lowercase letters and one digit,
/// e.g. `ind1`, `usa1`, `deu1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Parse and validate a region code. Accepts the lowercase storage form
    /// and the uppercase wire form.
    ///
    /// # Errors
    /// Returns `RegionError::InvalidCode` if the code does not match
    /// `^[a-z]{3}[0-9]$`.
    pub fn parse(s: &str) -> Result<Self, RegionError> {
        let lower = s.to_ascii_lowercase();
        let bytes = lower.as_bytes();
        let well_formed = bytes.len() == 4
            && bytes[..3].iter().all(u8::is_ascii_lowercase)
            && bytes[3].is_ascii_digit();
        if !well_formed {
            return Err(RegionError::InvalidCode(s.to_owned()));
        }
        Ok(Self(lower))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The uppercase form used as a token prefix on the wire.
    #[must_use]
    pub fn wire_prefix(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RegionCode {
    type Error = RegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(value: RegionCode) -> Self {
        value.0
    }
}

/// Per-region handle: the regional database pool and the peer node's base
/// URL for cross-region proxying.
#[derive(Clone)]
pub struct RegionHandle {
    pub db: Db,
    pub base_url: Url,
}

/// Immutable map from region codes to regional handles, plus the current
/// node's own region.
pub struct RegionRegistry {
    current: RegionCode,
    regions: HashMap<RegionCode, RegionHandle>,
}

impl RegionRegistry {
    /// Build the registry at boot.
    ///
    /// # Errors
    /// Returns `RegionError::Unknown` if `current` is not among the
    /// configured regions.
    pub fn new(
        current: RegionCode,
        regions: HashMap<RegionCode, RegionHandle>,
    ) -> Result<Self, RegionError> {
        if !regions.contains_key(&current) {
            return Err(RegionError::Unknown(current.as_str().to_owned()));
        }
        Ok(Self { current, regions })
    }

    #[must_use]
    pub fn current(&self) -> &RegionCode {
        &self.current
    }

    #[must_use]
    pub fn is_known(&self, code: &RegionCode) -> bool {
        self.regions.contains_key(code)
    }

    #[must_use]
    pub fn is_local(&self, code: &RegionCode) -> bool {
        *code == self.current
    }

    /// The regional database pool for `code`.
    ///
    /// # Errors
    /// Returns `RegionError::Unknown` for unconfigured regions.
    pub fn db(&self, code: &RegionCode) -> Result<&Db, RegionError> {
        self.regions
            .get(code)
            .map(|h| &h.db)
            .ok_or_else(|| RegionError::Unknown(code.as_str().to_owned()))
    }

    /// The database pool of the current node's own region.
    #[must_use]
    pub fn local_db(&self) -> &Db {
        // The constructor guarantees the current region is configured.
        &self.regions[&self.current].db
    }

    /// The peer base URL for `code`, used by the cross-region proxy.
    ///
    /// # Errors
    /// Returns `RegionError::Unknown` for unconfigured regions.
    pub fn base_url(&self, code: &RegionCode) -> Result<&Url, RegionError> {
        self.regions
            .get(code)
            .map(|h| &h.base_url)
            .ok_or_else(|| RegionError::Unknown(code.as_str().to_owned()))
    }

    pub fn codes(&self) -> impl Iterator<Item = &RegionCode> {
        self.regions.keys()
    }
}
