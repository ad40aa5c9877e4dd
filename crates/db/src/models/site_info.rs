use notif_core::credentials::ProviderCredentials;
use sqlx::FromRow;

/// The single row of the `site_info` table.
#[derive(Debug, Clone, Default, FromRow)]
pub struct SiteInfo {
    pub twilio_sid: String,
    pub twilio_token: String,
    pub twilio_from: String,
}

impl SiteInfo {
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials::new(&self.twilio_sid, &self.twilio_token, &self.twilio_from)
    }
}

impl From<ProviderCredentials> for SiteInfo {
    fn from(c: ProviderCredentials) -> Self {
        Self {
            twilio_sid: c.account_sid,
            twilio_token: c.auth_token,
            twilio_from: c.from_number,
        }
    }
}
