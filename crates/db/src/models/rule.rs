//! Routing rules mapping notifications to delivery methods.

use notif_core::priority::Priority;
use notif_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Value of `rules.priority` that matches every priority.
pub const ANY_PRIORITY: i16 = 0;

/// A row from the `rules` table.
#[derive(Debug, Clone, FromRow)]
pub struct Rule {
    pub id: DbId,
    pub user_id: DbId,
    /// `0` matches any priority, otherwise an exact priority level.
    pub priority: i16,
    /// Empty matches any sender domain.
    pub domain: String,
    pub method_id: DbId,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Rule {
    /// Whether this rule selects a notification with the given sender
    /// domain and priority.
    pub fn matches(&self, from_domain: &str, priority: Priority) -> bool {
        self.is_active
            && (self.domain.is_empty() || self.domain == from_domain)
            && (self.priority == ANY_PRIORITY || self.priority == priority.as_i16())
    }
}

#[derive(Debug, Clone)]
pub struct CreateRule {
    pub user_id: DbId,
    pub priority: i16,
    pub domain: String,
    pub method_id: DbId,
    pub is_active: bool,
}
