//! Submission lifecycle: create, revise and delete signed notifications.
//!
//! Every operation decodes the envelope first, then checks the target and
//! its authorization, then verifies the signature against the key the
//! authorization's domain publishes. Nothing is written until all of that
//! has passed. Accepted creates and revisions are queued for dispatch; the
//! queue slot is reserved before the write, so a request that gives up while
//! waiting on a full queue leaves nothing behind.

use std::sync::Arc;

use chrono::Utc;
use notif_core::envelope::{parse_submission, DecodedEnvelope};
use notif_core::error::CoreError;
use notif_core::priority::Priority;
use notif_core::signature::SignatureVerifier;
use notif_core::types::SOURCE_NATIVE;
use notif_db::models::authorization::Authorization;
use notif_db::models::notification::{NewNotification, Notification, NotificationRevision};
use notif_db::Store;
use notif_dispatch::{DispatchPermit, DispatchQueue};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn Store>,
    verifier: SignatureVerifier,
    queue: DispatchQueue,
}

impl IngestService {
    pub fn new(store: Arc<dyn Store>, verifier: SignatureVerifier, queue: DispatchQueue) -> Self {
        Self {
            store,
            verifier,
            queue,
        }
    }

    /// Accept a new notification against the authorization at `address`.
    ///
    /// Returns the assigned notification id.
    pub async fn create(&self, address: &str, body: &[u8]) -> AppResult<String> {
        let envelope = parse_submission(body)?;

        let auth = self
            .store
            .find_authorization(address)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| CoreError::not_found("Authorization", address))?;
        ensure_active(&auth)?;

        self.verify(&envelope, &auth).await?;

        let permit = self.reserve().await?;

        let payload = envelope.payload;
        let input = NewNotification {
            notid: uuid::Uuid::new_v4().to_string(),
            address: auth.address.clone(),
            user_id: auth.user_id,
            from_domain: auth.domain.clone(),
            description: auth.description.clone(),
            source: SOURCE_NATIVE.to_string(),
            priority: clamp_priority(payload.priority, &auth),
            subject: payload.subject,
            body: payload.body,
            origination_time: payload.origination_time,
            expires_at: payload.expires_at,
        };

        let created = self.store.create_notification(&input, Utc::now()).await?;
        tracing::info!(
            notid = %created.notid,
            address = %created.address,
            priority = %created.priority,
            "Notification created"
        );

        let notid = created.notid.clone();
        permit.send(created);
        Ok(notid)
    }

    /// Replace the content of notification `notid` with a strictly newer
    /// revision.
    pub async fn revise(&self, notid: &str, body: &[u8]) -> AppResult<()> {
        let envelope = parse_submission(body)?;

        let stored = self.find_live(notid).await?;
        let auth = self
            .store
            .find_authorization(&stored.address)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| CoreError::not_found("Authorization", stored.address.as_str()))?;
        ensure_active(&auth)?;

        self.verify(&envelope, &auth).await?;

        let payload = envelope.payload;
        if payload.origination_time <= stored.origination_time {
            tracing::warn!(notid, "Update is not later than the stored notification");
            return Err(CoreError::Conflict(
                "Update must be later than the stored notification".into(),
            )
            .into());
        }

        let permit = self.reserve().await?;

        let revision = NotificationRevision {
            priority: clamp_priority(payload.priority, &auth),
            subject: payload.subject,
            body: payload.body,
            origination_time: payload.origination_time,
            expires_at: payload.expires_at,
        };

        // A concurrent write may have moved the notification on since it was read.
        let revised = self
            .store
            .revise_notification(notid, &revision, Utc::now())
            .await?
            .ok_or_else(|| {
                CoreError::Conflict("Update must be later than the stored notification".into())
            })?;
        tracing::info!(
            notid = %revised.notid,
            revision = revised.revision_count,
            "Notification revised"
        );

        permit.send(revised);
        Ok(())
    }

    /// Soft-delete notification `notid`. Deletions are not dispatched.
    pub async fn delete(&self, notid: &str, body: &[u8]) -> AppResult<()> {
        let envelope = parse_submission(body)?;

        let stored = self.find_live(notid).await?;
        let auth = self
            .store
            .find_authorization(&stored.address)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| CoreError::not_found("Authorization", stored.address.as_str()))?;
        ensure_active(&auth)?;

        self.verify(&envelope, &auth).await?;

        self.store
            .delete_notification(notid, Utc::now())
            .await?
            .ok_or_else(|| CoreError::not_found("Notification", notid))?;
        tracing::info!(notid, "Notification deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn find_live(&self, notid: &str) -> AppResult<Notification> {
        let found = self
            .store
            .find_notification(notid)
            .await?
            .filter(|n| !n.is_deleted)
            .ok_or_else(|| CoreError::not_found("Notification", notid))?;
        Ok(found)
    }

    async fn verify(&self, envelope: &DecodedEnvelope, auth: &Authorization) -> AppResult<()> {
        if let Err(e) = self
            .verifier
            .verify(&envelope.header, &envelope.raw, &auth.domain)
            .await
        {
            tracing::warn!(
                address = %auth.address,
                domain = %auth.domain,
                selector = %envelope.header.selector,
                error = %e,
                "Signature rejected"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Hold a dispatch slot for a write that is about to happen. Waits while
    /// the queue is full. The queue only closes during shutdown.
    async fn reserve(&self) -> AppResult<DispatchPermit> {
        self.queue.reserve().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to reserve dispatch slot");
            AppError::InternalError(e.to_string())
        })
    }
}

fn ensure_active(auth: &Authorization) -> AppResult<()> {
    if !auth.is_active {
        tracing::warn!(address = %auth.address, "Inactive authorization");
        return Err(CoreError::Conflict("Inactive authorization".into()).into());
    }
    Ok(())
}

/// Lower a requested priority to the most urgent level the authorization
/// allows.
fn clamp_priority(requested: Priority, auth: &Authorization) -> Priority {
    let granted = requested.clamp_to(auth.max_priority);
    if granted != requested {
        tracing::info!(
            address = %auth.address,
            requested = %requested,
            granted = %granted,
            "Authorized priority exceeded"
        );
    }
    granted
}
