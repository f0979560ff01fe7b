//! TXT resolution behind a trait seam.
//!
//! Production uses hickory with the system resolver configuration; tests use
//! [`StaticTxtResolver`]. Any resolver error counts as a verification
//! failure upstream; nothing here degrades to implicit success.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("TXT lookup failed: {0}")]
    Lookup(String),
}

/// TXT record lookup. Returns every string found at `host`, with TXT
/// character-string segments concatenated per record.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    async fn txt(&self, host: &str) -> Result<Vec<String>, DnsError>;
}

/// Hickory-backed resolver with a per-lookup deadline.
pub struct HickoryTxtResolver {
    resolver: TokioResolver,
}

impl HickoryTxtResolver {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let mut builder = Resolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        );
        builder.options_mut().timeout = timeout;
        Self {
            resolver: builder.build(),
        }
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn txt(&self, host: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self
            .resolver
            .txt_lookup(host.to_owned())
            .await
            .map_err(|e| DnsError::Lookup(e.to_string()))?;

        let mut records = Vec::new();
        for txt in lookup.iter() {
            let mut value = String::new();
            for segment in txt.txt_data() {
                value.push_str(&String::from_utf8_lossy(segment));
            }
            records.push(value);
        }
        Ok(records)
    }
}

/// In-memory resolver for tests and local development.
#[derive(Default)]
pub struct StaticTxtResolver {
    records: Mutex<HashMap<String, Vec<String>>>,
}

impl StaticTxtResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, host: &str, value: &str) {
        self.records
            .lock()
            .expect("resolver lock")
            .entry(host.to_owned())
            .or_default()
            .push(value.to_owned());
    }

    pub fn clear(&self, host: &str) {
        self.records.lock().expect("resolver lock").remove(host);
    }
}

#[async_trait]
impl TxtResolver for StaticTxtResolver {
    async fn txt(&self, host: &str) -> Result<Vec<String>, DnsError> {
        self.records
            .lock()
            .expect("resolver lock")
            .get(host)
            .cloned()
            .ok_or_else(|| DnsError::Lookup(format!("no TXT records for {host}")))
    }
}
