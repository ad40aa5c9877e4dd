//! The persistence seam used by ingestion and dispatch.

use async_trait::async_trait;
use notif_core::types::{DbId, Timestamp};

use crate::models::authorization::Authorization;
use crate::models::method::Method;
use crate::models::notification::{NewNotification, Notification, NotificationRevision};
use crate::models::rule::Rule;
use crate::models::site_info::SiteInfo;
use crate::models::user_info::UserInfo;
use crate::repositories::{
    AuthorizationRepo, MethodRepo, NotificationRepo, RuleRepo, SiteInfoRepo, UserInfoRepo,
};
use crate::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Load/save/update-by-key over the relay's record kinds.
///
/// Lifecycle writes (`create_notification`, `revise_notification`,
/// `delete_notification`) also maintain the activity counters of the owning
/// authorization and user. Implementations must make each of them atomic.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_authorization(&self, address: &str)
        -> Result<Option<Authorization>, StoreError>;

    async fn find_notification(&self, notid: &str) -> Result<Option<Notification>, StoreError>;

    /// Persist a new notification; authorization and user count +1 and
    /// latest = `now`.
    async fn create_notification(
        &self,
        input: &NewNotification,
        now: Timestamp,
    ) -> Result<Notification, StoreError>;

    /// Overwrite a live notification if `revision` is strictly newer;
    /// revision count +1, unread, authorization and user latest = `now`.
    /// `None` means nothing was written.
    async fn revise_notification(
        &self,
        notid: &str,
        revision: &NotificationRevision,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError>;

    /// Soft-delete a live notification. `None` means nothing was written.
    async fn delete_notification(
        &self,
        notid: &str,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError>;

    async fn find_user_info(&self, user_id: DbId) -> Result<Option<UserInfo>, StoreError>;

    /// A user's rules in store order.
    async fn list_rules_for_user(&self, user_id: DbId) -> Result<Vec<Rule>, StoreError>;

    async fn find_method(&self, id: DbId) -> Result<Option<Method>, StoreError>;

    async fn load_site_info(&self) -> Result<Option<SiteInfo>, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`Store`] backed by the repositories over a connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_authorization(
        &self,
        address: &str,
    ) -> Result<Option<Authorization>, StoreError> {
        Ok(AuthorizationRepo::find_by_address(&self.pool, address).await?)
    }

    async fn find_notification(&self, notid: &str) -> Result<Option<Notification>, StoreError> {
        Ok(NotificationRepo::find_by_notid(&self.pool, notid).await?)
    }

    async fn create_notification(
        &self,
        input: &NewNotification,
        now: Timestamp,
    ) -> Result<Notification, StoreError> {
        Ok(NotificationRepo::create(&self.pool, input, now).await?)
    }

    async fn revise_notification(
        &self,
        notid: &str,
        revision: &NotificationRevision,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError> {
        Ok(NotificationRepo::revise(&self.pool, notid, revision, now).await?)
    }

    async fn delete_notification(
        &self,
        notid: &str,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError> {
        Ok(NotificationRepo::soft_delete(&self.pool, notid, now).await?)
    }

    async fn find_user_info(&self, user_id: DbId) -> Result<Option<UserInfo>, StoreError> {
        Ok(UserInfoRepo::find_by_user_id(&self.pool, user_id).await?)
    }

    async fn list_rules_for_user(&self, user_id: DbId) -> Result<Vec<Rule>, StoreError> {
        Ok(RuleRepo::list_for_user(&self.pool, user_id).await?)
    }

    async fn find_method(&self, id: DbId) -> Result<Option<Method>, StoreError> {
        Ok(MethodRepo::find_by_id(&self.pool, id).await?)
    }

    async fn load_site_info(&self) -> Result<Option<SiteInfo>, StoreError> {
        Ok(SiteInfoRepo::find(&self.pool).await?)
    }
}
