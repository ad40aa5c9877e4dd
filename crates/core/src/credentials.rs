//! Delivery provider credentials.
//!
//! Site-wide defaults come from `site_info`; a user may override any field.
//! Resolution is per field: a non-empty user value wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl ProviderCredentials {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        }
    }
}

/// Effective credentials for one delivery.
pub fn resolve_credentials(
    user: Option<&ProviderCredentials>,
    site: &ProviderCredentials,
) -> ProviderCredentials {
    let Some(user) = user else {
        return site.clone();
    };

    let pick = |own: &str, default: &str| {
        if own.is_empty() { default } else { own }.to_string()
    };

    ProviderCredentials {
        account_sid: pick(&user.account_sid, &site.account_sid),
        auth_token: pick(&user.auth_token, &site.auth_token),
        from_number: pick(&user.from_number, &site.from_number),
    }
}
