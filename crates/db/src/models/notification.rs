//! Stored notifications and the write DTOs of their lifecycle.

use notif_core::priority::Priority;
use notif_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub notid: String,
    /// Authorization address the notification was submitted against.
    pub address: String,
    pub user_id: DbId,
    pub from_domain: String,
    pub description: String,
    pub source: String,
    pub subject: String,
    pub body: String,
    #[sqlx(try_from = "i16")]
    pub priority: Priority,
    pub origination_time: Timestamp,
    pub expires_at: Timestamp,
    pub received_at: Timestamp,
    pub revision_count: i32,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_deleted: bool,
}

/// DTO for an accepted create.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notid: String,
    pub address: String,
    pub user_id: DbId,
    pub from_domain: String,
    pub description: String,
    pub source: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub origination_time: Timestamp,
    pub expires_at: Timestamp,
}

/// Fields overwritten by an accepted update.
#[derive(Debug, Clone)]
pub struct NotificationRevision {
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub origination_time: Timestamp,
    pub expires_at: Timestamp,
}
