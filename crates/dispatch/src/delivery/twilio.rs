//! Twilio REST delivery.
//!
//! Text messages are posted to `Messages.json` and voice calls to
//! `Calls.json` under the account's API path, authenticated with HTTP basic
//! auth (account SID and auth token). A call's `Url` points at TwiML that
//! reads the message aloud. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use notif_core::credentials::ProviderCredentials;

use super::{DeliveryChannel, DeliveryError, OutboundMessage};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

const API_VERSION: &str = "2010-04-01";

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TwilioChannel {
    client: reqwest::Client,
    api_base: String,
}

impl TwilioChannel {
    pub fn new(api_base: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, account_sid: &str, resource: &str) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{account_sid}/{resource}.json",
            self.api_base
        )
    }

    async fn post_form(
        &self,
        credentials: &ProviderCredentials,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<(), DeliveryError> {
        let url = self.endpoint(&credentials.account_sid, resource);
        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::HttpStatus(status.as_u16()));
        }
        tracing::debug!(url = %url, status = status.as_u16(), "Provider accepted request");
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for TwilioChannel {
    async fn deliver(
        &self,
        credentials: &ProviderCredentials,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        if credentials.account_sid.is_empty() {
            return Err(DeliveryError::MissingCredentials("account SID"));
        }
        if credentials.auth_token.is_empty() {
            return Err(DeliveryError::MissingCredentials("auth token"));
        }

        match message {
            OutboundMessage::Text { to, from, body } => {
                self.post_form(
                    credentials,
                    "Messages",
                    &[("To", to.as_str()), ("From", from.as_str()), ("Body", body.as_str())],
                )
                .await
            }
            OutboundMessage::Voice {
                to,
                from,
                message_url,
            } => {
                self.post_form(
                    credentials,
                    "Calls",
                    &[
                        ("To", to.as_str()),
                        ("From", from.as_str()),
                        ("Url", message_url.as_str()),
                    ],
                )
                .await
            }
        }
    }
}
