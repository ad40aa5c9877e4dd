//! DNS TXT record lookups.
//!
//! [`TxtLookup`] is the seam between key resolution and the network.
//! Production code uses [`HickoryTxtLookup`]; tests and offline setups use
//! [`StaticTxtLookup`].

use std::collections::HashMap;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;

#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("DNS resolution failed: {0}")]
    Resolve(#[from] hickory_resolver::error::ResolveError),

    #[error("No TXT records for {0}")]
    NoRecords(String),
}

/// Look up the TXT records published at a name.
///
/// Each returned string is one record with its character-strings joined,
/// in the order the resolver returned them.
#[async_trait]
pub trait TxtLookup: Send + Sync {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

// ---------------------------------------------------------------------------
// Hickory
// ---------------------------------------------------------------------------

/// TXT lookups through the system resolver configuration.
pub struct HickoryTxtLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtLookup {
    /// Build a resolver from `/etc/resolv.conf` (or the platform equivalent).
    pub fn from_system_conf() -> Result<Self, DnsError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(Self { resolver })
    }
}

#[async_trait]
impl TxtLookup for HickoryTxtLookup {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.resolver.txt_lookup(name).await?;
        let records = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect();
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Static table
// ---------------------------------------------------------------------------

/// Fixed name → records table.
#[derive(Debug, Clone, Default)]
pub struct StaticTxtLookup {
    records: HashMap<String, Vec<String>>,
}

impl StaticTxtLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `record` at `name`, after any records already there.
    pub fn with_record(mut self, name: impl Into<String>, record: impl Into<String>) -> Self {
        self.records
            .entry(name.into())
            .or_default()
            .push(record.into());
        self
    }
}

#[async_trait]
impl TxtLookup for StaticTxtLookup {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        match self.records.get(name) {
            Some(records) if !records.is_empty() => Ok(records.clone()),
            _ => Err(DnsError::NoRecords(name.to_string())),
        }
    }
}
