//! In-process [`Store`] for tests and database-less runs.
//!
//! Every operation takes the single state lock, so each lifecycle write is
//! atomic. [`InMemoryStore::set_failing`] makes every call fail with
//! [`StoreError::Unavailable`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use notif_core::credentials::ProviderCredentials;
use notif_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::models::authorization::{Authorization, CreateAuthorization};
use crate::models::method::{CreateMethod, Method};
use crate::models::notification::{NewNotification, Notification, NotificationRevision};
use crate::models::rule::{CreateRule, Rule};
use crate::models::site_info::SiteInfo;
use crate::models::user_info::UserInfo;
use crate::store::{Store, StoreError};

#[derive(Default)]
struct State {
    next_id: DbId,
    authorizations: HashMap<String, Authorization>,
    notifications: Vec<Notification>,
    user_info: HashMap<DbId, UserInfo>,
    methods: HashMap<DbId, Method>,
    rules: Vec<Rule>,
    site_info: Option<SiteInfo>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn live_notification_mut(&mut self, notid: &str) -> Option<&mut Notification> {
        self.notifications
            .iter_mut()
            .find(|n| n.notid == notid && !n.is_deleted)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`Store`] call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store set to fail".into()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub async fn insert_authorization(&self, input: CreateAuthorization) -> Authorization {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let auth = Authorization {
            id: state.next_id(),
            address: input.address,
            user_id: input.user_id,
            domain: input.domain,
            description: input.description,
            max_priority: input.max_priority,
            count: 0,
            latest: None,
            is_active: input.is_active,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        state
            .authorizations
            .insert(auth.address.clone(), auth.clone());
        auth
    }

    /// Returns `false` if no authorization has that address.
    pub async fn set_authorization_status(
        &self,
        address: &str,
        is_active: bool,
        is_deleted: bool,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.authorizations.get_mut(address) {
            Some(auth) => {
                auth.is_active = is_active;
                auth.is_deleted = is_deleted;
                auth.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn insert_user_info(
        &self,
        user_id: DbId,
        credentials: ProviderCredentials,
    ) -> UserInfo {
        let info = UserInfo {
            user_id,
            count: 0,
            latest: None,
            twilio_sid: credentials.account_sid,
            twilio_token: credentials.auth_token,
            twilio_from: credentials.from_number,
        };
        self.state
            .lock()
            .await
            .user_info
            .insert(user_id, info.clone());
        info
    }

    pub async fn insert_method(&self, input: CreateMethod) -> Method {
        let mut state = self.state.lock().await;
        let method = Method {
            id: state.next_id(),
            user_id: input.user_id,
            name: input.name,
            mode: input.mode,
            address: input.address,
            preamble: input.preamble,
            is_active: input.is_active,
            created_at: Utc::now(),
        };
        state.methods.insert(method.id, method.clone());
        method
    }

    /// Remove a method while leaving rules that point at it.
    pub async fn remove_method(&self, id: DbId) -> bool {
        self.state.lock().await.methods.remove(&id).is_some()
    }

    pub async fn insert_rule(&self, input: CreateRule) -> Rule {
        let mut state = self.state.lock().await;
        let rule = Rule {
            id: state.next_id(),
            user_id: input.user_id,
            priority: input.priority,
            domain: input.domain,
            method_id: input.method_id,
            is_active: input.is_active,
            created_at: Utc::now(),
        };
        state.rules.push(rule.clone());
        rule
    }

    pub async fn set_site_info(&self, info: SiteInfo) {
        self.state.lock().await.site_info = Some(info);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub async fn authorization(&self, address: &str) -> Option<Authorization> {
        self.state.lock().await.authorizations.get(address).cloned()
    }

    pub async fn user_info(&self, user_id: DbId) -> Option<UserInfo> {
        self.state.lock().await.user_info.get(&user_id).cloned()
    }

    /// Every stored notification, deleted included, in insertion order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn find_authorization(
        &self,
        address: &str,
    ) -> Result<Option<Authorization>, StoreError> {
        self.check()?;
        Ok(self.authorization(address).await)
    }

    async fn find_notification(&self, notid: &str) -> Result<Option<Notification>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state.notifications.iter().find(|n| n.notid == notid).cloned())
    }

    async fn create_notification(
        &self,
        input: &NewNotification,
        now: Timestamp,
    ) -> Result<Notification, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;

        let notification = Notification {
            id: state.next_id(),
            notid: input.notid.clone(),
            address: input.address.clone(),
            user_id: input.user_id,
            from_domain: input.from_domain.clone(),
            description: input.description.clone(),
            source: input.source.clone(),
            subject: input.subject.clone(),
            body: input.body.clone(),
            priority: input.priority,
            origination_time: input.origination_time,
            expires_at: input.expires_at,
            received_at: now,
            revision_count: 0,
            is_read: false,
            read_at: None,
            is_deleted: false,
        };
        state.notifications.push(notification.clone());

        if let Some(auth) = state.authorizations.get_mut(&input.address) {
            auth.count += 1;
            auth.latest = Some(now);
        }
        match state.user_info.get_mut(&input.user_id) {
            Some(info) => {
                info.count += 1;
                info.latest = Some(now);
            }
            None => tracing::warn!(user_id = input.user_id, "No user info row to count create"),
        }

        Ok(notification)
    }

    async fn revise_notification(
        &self,
        notid: &str,
        revision: &NotificationRevision,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;

        let Some(stored) = state.live_notification_mut(notid) else {
            return Ok(None);
        };
        if stored.origination_time >= revision.origination_time {
            return Ok(None);
        }

        stored.subject = revision.subject.clone();
        stored.body = revision.body.clone();
        stored.priority = revision.priority;
        stored.origination_time = revision.origination_time;
        stored.expires_at = revision.expires_at;
        stored.received_at = now;
        stored.revision_count += 1;
        stored.is_read = false;
        let updated = stored.clone();

        if let Some(auth) = state.authorizations.get_mut(&updated.address) {
            auth.latest = Some(now);
        }
        if let Some(info) = state.user_info.get_mut(&updated.user_id) {
            info.latest = Some(now);
        }

        Ok(Some(updated))
    }

    async fn delete_notification(
        &self,
        notid: &str,
        now: Timestamp,
    ) -> Result<Option<Notification>, StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;

        Ok(state.live_notification_mut(notid).map(|stored| {
            stored.is_deleted = true;
            stored.received_at = now;
            stored.clone()
        }))
    }

    async fn find_user_info(&self, user_id: DbId) -> Result<Option<UserInfo>, StoreError> {
        self.check()?;
        Ok(self.user_info(user_id).await)
    }

    async fn list_rules_for_user(&self, user_id: DbId) -> Result<Vec<Rule>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .rules
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_method(&self, id: DbId) -> Result<Option<Method>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.methods.get(&id).cloned())
    }

    async fn load_site_info(&self) -> Result<Option<SiteInfo>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.site_info.clone())
    }
}
