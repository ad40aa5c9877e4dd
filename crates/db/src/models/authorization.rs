//! Sender authorizations: an address token bound to a user and a trusted
//! signer domain.

use notif_core::priority::Priority;
use notif_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `authorizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Authorization {
    pub id: DbId,
    /// Opaque token the sender uses as the `to` address.
    pub address: String,
    pub user_id: DbId,
    /// Domain whose DNS publishes the sender's signing keys.
    pub domain: String,
    pub description: String,
    /// Most urgent priority the sender may use.
    #[sqlx(try_from = "i16")]
    pub max_priority: Priority,
    pub count: i64,
    pub latest: Option<Timestamp>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an authorization. Provisioning happens outside the
/// relay; this exists for seeding and tests.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthorization {
    pub address: String,
    pub user_id: DbId,
    pub domain: String,
    pub description: String,
    pub max_priority: Priority,
    pub is_active: bool,
}
