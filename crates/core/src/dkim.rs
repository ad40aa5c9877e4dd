//! DKIM-style signer key records.
//!
//! A sender publishes its public key as a TXT record at
//! `<selector>._domainkey.<domain>`, formatted as `tag=value` fields
//! separated by semicolons, e.g. `v=DKIM1; k=rsa; h=sha256; s=notif; p=MIIB...`.

use std::sync::Arc;

use crate::dns::TxtLookup;

/// Label inserted between selector and domain.
pub const KEY_LABEL: &str = "_domainkey";

/// Required value of the `v` tag, when present.
pub const KEY_VERSION: &str = "DKIM1";

/// Required value of the `k` tag, when present.
pub const KEY_TYPE: &str = "rsa";

/// Required value of the `h` tag, when present.
pub const HASH_ALGORITHM: &str = "sha256";

/// Accepted values of the `s` tag, when present.
pub const SERVICE_ANY: &str = "*";
pub const SERVICE_NOTIF: &str = "notif";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyRecordError {
    #[error("unsupported key record version: {0}")]
    Version(String),

    #[error("unsupported key type: {0}")]
    KeyType(String),

    #[error("unsupported hash algorithm: {0}")]
    HashAlgorithm(String),

    #[error("key not valid for service: {0}")]
    Service(String),
}

/// DNS name holding the key for `selector` at `domain`.
pub fn key_record_name(selector: &str, domain: &str) -> String {
    format!("{selector}.{KEY_LABEL}.{domain}")
}

/// Extract the base64 public key (`p` tag) from a key record.
///
/// Fields are scanned left to right. `v`, `k`, `h` and `s` must carry the
/// expected values or the whole record is rejected. A field with no `=`
/// ends the scan; whatever was captured before it stands. Returns
/// `Ok(None)` when no non-empty `p` was seen (an empty `p=` marks a revoked
/// key). The key itself is not validated here.
pub fn parse_key_record(record: &str) -> Result<Option<String>, KeyRecordError> {
    let mut key = None;

    for field in record.split(';') {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let Some((tag, value)) = field.split_once('=') else {
            break;
        };
        let value = value.trim();

        match tag.trim() {
            "v" if value != KEY_VERSION => {
                return Err(KeyRecordError::Version(value.to_string()));
            }
            "k" if value != KEY_TYPE => {
                return Err(KeyRecordError::KeyType(value.to_string()));
            }
            "h" if value != HASH_ALGORITHM => {
                return Err(KeyRecordError::HashAlgorithm(value.to_string()));
            }
            "s" if value != SERVICE_ANY && value != SERVICE_NOTIF => {
                return Err(KeyRecordError::Service(value.to_string()));
            }
            // Published keys are sometimes folded with whitespace.
            "p" => key = Some(value.split_whitespace().collect::<String>()),
            _ => {}
        }
    }

    Ok(key.filter(|k| !k.is_empty()))
}

// ---------------------------------------------------------------------------
// KeyResolver
// ---------------------------------------------------------------------------

/// Resolves a selector + domain pair to the signer's base64 public key.
#[derive(Clone)]
pub struct KeyResolver {
    lookup: Arc<dyn TxtLookup>,
}

impl KeyResolver {
    pub fn new(lookup: Arc<dyn TxtLookup>) -> Self {
        Self { lookup }
    }

    /// Returns `None` when the record is missing, unusable, or lacks a key.
    ///
    /// Only the first TXT record at the name is considered; multiple
    /// records are not disambiguated. Lookup failures are logged and
    /// reported as not-found.
    pub async fn resolve(&self, selector: &str, domain: &str) -> Option<String> {
        let name = key_record_name(selector, domain);

        let records = match self.lookup.lookup_txt(&name).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Signature key not found");
                return None;
            }
        };

        let first = records.first()?;
        match parse_key_record(first) {
            Ok(Some(key)) => Some(key),
            Ok(None) => {
                tracing::warn!(name = %name, "Key record has no public key");
                None
            }
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Key record rejected");
                None
            }
        }
    }
}
