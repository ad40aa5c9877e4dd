//! Outbound delivery channels for text messages and voice calls.

pub mod twilio;

use async_trait::async_trait;
use notif_core::credentials::ProviderCredentials;
use reqwest::Url;

/// Base of the hosted TwiML app that reads a message aloud.
pub const VOICE_MESSAGE_BASE: &str = "http://twimlets.com/message";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Missing provider credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

/// A single message ready to hand to the provider. Numbers are already
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text { to: String, from: String, body: String },
    Voice { to: String, from: String, message_url: String },
}

impl OutboundMessage {
    pub fn to(&self) -> &str {
        match self {
            OutboundMessage::Text { to, .. } | OutboundMessage::Voice { to, .. } => to,
        }
    }
}

/// Sends text messages and places voice calls.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(
        &self,
        credentials: &ProviderCredentials,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError>;
}

/// Text message body: `"<preamble>: <subject>"`.
pub fn text_body(preamble: &str, subject: &str) -> String {
    format!("{preamble}: {subject}")
}

/// URL the provider fetches to speak `"<preamble> <subject>"`.
pub fn voice_message_url(preamble: &str, subject: &str) -> Result<String, DeliveryError> {
    let spoken = format!("{preamble} {subject}");
    let url = Url::parse_with_params(VOICE_MESSAGE_BASE, [("Message[0]", spoken.as_str())])
        .map_err(|e| DeliveryError::InvalidUrl(e.to_string()))?;
    Ok(url.into())
}
