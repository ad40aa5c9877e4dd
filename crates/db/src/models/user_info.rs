use notif_core::credentials::ProviderCredentials;
use notif_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_info` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserInfo {
    pub user_id: DbId,
    pub count: i64,
    pub latest: Option<Timestamp>,
    pub twilio_sid: String,
    #[serde(skip_serializing)]
    pub twilio_token: String,
    pub twilio_from: String,
}

impl UserInfo {
    /// Per-user provider overrides; empty fields defer to the site.
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials::new(&self.twilio_sid, &self.twilio_token, &self.twilio_from)
    }
}
