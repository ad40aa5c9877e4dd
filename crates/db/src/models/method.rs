//! Delivery methods: where and how a user wants to be reached.

use notif_core::delivery_mode::DeliveryMode;
use notif_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `methods` table.
#[derive(Debug, Clone, FromRow)]
pub struct Method {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    #[sqlx(try_from = "i16")]
    pub mode: DeliveryMode,
    /// Destination phone number (or email address for email methods).
    pub address: String,
    /// Text prepended to the subject when the message is sent.
    pub preamble: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMethod {
    pub user_id: DbId,
    pub name: String,
    pub mode: DeliveryMode,
    pub address: String,
    pub preamble: String,
    pub is_active: bool,
}
