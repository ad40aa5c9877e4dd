//! Rule evaluation and per-method delivery.
//!
//! For each notification the owning user's rules are walked in store order.
//! Every matching rule selects its method, and each method is delivered to at
//! most once per notification. A failing method is logged and does not stop
//! the rest.

use std::collections::HashSet;
use std::sync::Arc;

use notif_core::credentials::{resolve_credentials, ProviderCredentials};
use notif_core::delivery_mode::DeliveryMode;
use notif_core::phone::normalize_e164;
use notif_core::types::DbId;
use notif_db::models::method::Method;
use notif_db::models::notification::Notification;
use notif_db::Store;

use crate::delivery::{text_body, voice_message_url, DeliveryChannel, OutboundMessage};

/// What happened to one selected method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Skipped(&'static str),
    Failed,
}

/// Per-method outcomes of one dispatch, in the order methods were selected.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<(DbId, Outcome)>,
}

impl DispatchReport {
    pub fn delivered(&self) -> Vec<DbId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == Outcome::Delivered)
            .map(|(id, _)| *id)
            .collect()
    }
}

pub struct DispatchEngine {
    store: Arc<dyn Store>,
    channel: Arc<dyn DeliveryChannel>,
    site_credentials: ProviderCredentials,
}

impl DispatchEngine {
    /// `site_credentials` are the process-wide defaults, loaded once at
    /// startup.
    pub fn new(
        store: Arc<dyn Store>,
        channel: Arc<dyn DeliveryChannel>,
        site_credentials: ProviderCredentials,
    ) -> Self {
        Self {
            store,
            channel,
            site_credentials,
        }
    }

    /// Run a notification through its recipient's rules.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        let mut report = DispatchReport::default();

        let rules = match self.store.list_rules_for_user(notification.user_id).await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(
                    notid = %notification.notid,
                    user_id = notification.user_id,
                    error = %e,
                    "Failed to load rules"
                );
                return report;
            }
        };

        let user_credentials = match self.store.find_user_info(notification.user_id).await {
            Ok(Some(info)) => Some(info.credentials()),
            Ok(None) => {
                tracing::warn!(user_id = notification.user_id, "No user info, using site defaults");
                None
            }
            Err(e) => {
                tracing::warn!(
                    user_id = notification.user_id,
                    error = %e,
                    "Failed to load user info, using site defaults"
                );
                None
            }
        };
        let credentials = resolve_credentials(user_credentials.as_ref(), &self.site_credentials);

        let mut selected = HashSet::new();
        for rule in &rules {
            if !rule.matches(&notification.from_domain, notification.priority) {
                continue;
            }
            if !selected.insert(rule.method_id) {
                continue;
            }

            let method = match self.store.find_method(rule.method_id).await {
                Ok(Some(method)) => method,
                Ok(None) => {
                    tracing::warn!(method_id = rule.method_id, rule_id = rule.id, "Method not found");
                    report.outcomes.push((rule.method_id, Outcome::Skipped("method not found")));
                    continue;
                }
                Err(e) => {
                    tracing::error!(method_id = rule.method_id, error = %e, "Failed to load method");
                    report.outcomes.push((rule.method_id, Outcome::Failed));
                    continue;
                }
            };

            let outcome = self.deliver(&method, notification, &credentials).await;
            report.outcomes.push((method.id, outcome));
        }

        tracing::info!(
            notid = %notification.notid,
            rules = rules.len(),
            methods = report.outcomes.len(),
            delivered = report.delivered().len(),
            "Dispatch complete"
        );
        report
    }

    async fn deliver(
        &self,
        method: &Method,
        notification: &Notification,
        credentials: &ProviderCredentials,
    ) -> Outcome {
        if !method.is_active {
            tracing::debug!(method_id = method.id, "Method inactive, skipping");
            return Outcome::Skipped("method inactive");
        }
        let is_voice = match method.mode {
            DeliveryMode::Text => false,
            DeliveryMode::Voice => true,
            DeliveryMode::Email => {
                tracing::debug!(method_id = method.id, "Email delivery is not supported, skipping");
                return Outcome::Skipped("email not supported");
            }
        };
        if method.address.is_empty() {
            tracing::warn!(method_id = method.id, "Method has no destination number");
            return Outcome::Skipped("no destination");
        }
        if credentials.from_number.is_empty() {
            tracing::warn!(method_id = method.id, "No sending number configured");
            return Outcome::Skipped("no sending number");
        }

        let to = normalize_e164(&method.address);
        let from = normalize_e164(&credentials.from_number);
        for number in [&to, &from] {
            if !number.is_valid {
                tracing::warn!(method_id = method.id, number = %number.number, "Number is not valid E.164");
            }
        }

        let message = if is_voice {
            match voice_message_url(&method.preamble, &notification.subject) {
                Ok(message_url) => OutboundMessage::Voice {
                    to: to.number,
                    from: from.number,
                    message_url,
                },
                Err(e) => {
                    tracing::error!(method_id = method.id, error = %e, "Failed to build call URL");
                    return Outcome::Failed;
                }
            }
        } else {
            OutboundMessage::Text {
                to: to.number,
                from: from.number,
                body: text_body(&method.preamble, &notification.subject),
            }
        };

        match self.channel.deliver(credentials, &message).await {
            Ok(()) => {
                tracing::info!(
                    notid = %notification.notid,
                    method_id = method.id,
                    mode = method.mode.as_str(),
                    to = message.to(),
                    "Delivered"
                );
                Outcome::Delivered
            }
            Err(e) => {
                tracing::error!(
                    notid = %notification.notid,
                    method_id = method.id,
                    mode = method.mode.as_str(),
                    error = %e,
                    "Delivery failed"
                );
                Outcome::Failed
            }
        }
    }
}
