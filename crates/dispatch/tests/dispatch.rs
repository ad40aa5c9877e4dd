//! Dispatch engine and worker pool behaviour against the in-memory store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use notif_core::credentials::ProviderCredentials;
use notif_core::delivery_mode::DeliveryMode;
use notif_core::priority::Priority;
use notif_db::models::method::{CreateMethod, Method};
use notif_db::models::notification::Notification;
use notif_db::models::rule::CreateRule;
use notif_db::InMemoryStore;
use notif_dispatch::{
    DeliveryChannel, DeliveryError, DispatchEngine, DispatchQueue, OutboundMessage, Outcome,
    WorkerPool,
};

const USER_ID: i64 = 7;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every message; fails for destinations in `failing`.
#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<(ProviderCredentials, OutboundMessage)>>,
    failing: HashSet<String>,
}

impl RecordingChannel {
    fn failing_for(number: &str) -> Self {
        Self {
            failing: HashSet::from([number.to_string()]),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<(ProviderCredentials, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    fn destinations(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, m)| m.to().to_string())
            .collect()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver(
        &self,
        credentials: &ProviderCredentials,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        if self.failing.contains(message.to()) {
            return Err(DeliveryError::HttpStatus(500));
        }
        self.sent
            .lock()
            .unwrap()
            .push((credentials.clone(), message.clone()));
        Ok(())
    }
}

fn site() -> ProviderCredentials {
    ProviderCredentials::new("AC-site", "site-token", "555-000-0000")
}

fn notification(priority: Priority) -> Notification {
    let now = Utc::now();
    Notification {
        id: 1,
        notid: "n-1".to_string(),
        address: "addr-1".to_string(),
        user_id: USER_ID,
        from_domain: "sender.example".to_string(),
        description: String::new(),
        source: "native".to_string(),
        subject: "Disk full".to_string(),
        body: "db-1 at 99%".to_string(),
        priority,
        origination_time: now,
        expires_at: now,
        received_at: now,
        revision_count: 0,
        is_read: false,
        read_at: None,
        is_deleted: false,
    }
}

async fn method(store: &InMemoryStore, mode: DeliveryMode, address: &str) -> Method {
    store
        .insert_method(CreateMethod {
            user_id: USER_ID,
            name: address.to_string(),
            mode,
            address: address.to_string(),
            preamble: "Ops".to_string(),
            is_active: true,
        })
        .await
}

async fn rule(store: &InMemoryStore, priority: i16, domain: &str, method_id: i64) {
    store
        .insert_rule(CreateRule {
            user_id: USER_ID,
            priority,
            domain: domain.to_string(),
            method_id,
            is_active: true,
        })
        .await;
}

fn engine(store: &InMemoryStore, channel: &Arc<RecordingChannel>) -> DispatchEngine {
    DispatchEngine::new(Arc::new(store.clone()), channel.clone(), site())
}

// ---------------------------------------------------------------------------
// Rule matching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn each_method_is_delivered_once() {
    let store = InMemoryStore::new();
    let a = method(&store, DeliveryMode::Text, "555-111-1111").await;
    let b = method(&store, DeliveryMode::Text, "555-222-2222").await;
    rule(&store, 0, "", a.id).await;
    rule(&store, 0, "", b.id).await;
    rule(&store, 2, "sender.example", a.id).await;

    let channel = Arc::new(RecordingChannel::default());
    let report = engine(&store, &channel)
        .dispatch(&notification(Priority::High))
        .await;

    assert_eq!(report.delivered(), vec![a.id, b.id]);
    assert_eq!(channel.destinations(), vec!["+15551111111", "+15552222222"]);
}

#[tokio::test]
async fn non_matching_rules_select_nothing() {
    let store = InMemoryStore::new();
    let m = method(&store, DeliveryMode::Text, "555-111-1111").await;
    rule(&store, 1, "", m.id).await;
    rule(&store, 0, "other.example", m.id).await;
    store
        .insert_rule(CreateRule {
            user_id: USER_ID,
            priority: 0,
            domain: String::new(),
            method_id: m.id,
            is_active: false,
        })
        .await;

    let channel = Arc::new(RecordingChannel::default());
    let report = engine(&store, &channel)
        .dispatch(&notification(Priority::Routine))
        .await;

    assert!(report.outcomes.is_empty());
    assert!(channel.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Delivery step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn text_message_uses_preamble_and_effective_credentials() {
    let store = InMemoryStore::new();
    store
        .insert_user_info(USER_ID, ProviderCredentials::new("AC-user", "", ""))
        .await;
    let m = method(&store, DeliveryMode::Text, "(555) 123-4567").await;
    rule(&store, 0, "", m.id).await;

    let channel = Arc::new(RecordingChannel::default());
    engine(&store, &channel)
        .dispatch(&notification(Priority::Routine))
        .await;

    let sent = channel.sent();
    assert_eq!(sent.len(), 1);
    let (credentials, message) = &sent[0];
    assert_eq!(credentials.account_sid, "AC-user");
    assert_eq!(credentials.auth_token, "site-token");
    assert_eq!(
        message,
        &OutboundMessage::Text {
            to: "+15551234567".to_string(),
            from: "+15550000000".to_string(),
            body: "Ops: Disk full".to_string(),
        }
    );
}

#[tokio::test]
async fn voice_call_points_at_spoken_message() {
    let store = InMemoryStore::new();
    let m = method(&store, DeliveryMode::Voice, "+445551234567").await;
    rule(&store, 0, "", m.id).await;

    let channel = Arc::new(RecordingChannel::default());
    engine(&store, &channel)
        .dispatch(&notification(Priority::Emergency))
        .await;

    let sent = channel.sent();
    match &sent[0].1 {
        OutboundMessage::Voice {
            to, message_url, ..
        } => {
            assert_eq!(to, "+445551234567");
            assert_eq!(
                message_url,
                "http://twimlets.com/message?Message%5B0%5D=Ops+Disk+full"
            );
        }
        other => panic!("expected a voice call, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_method_does_not_stop_the_rest() {
    let store = InMemoryStore::new();
    let a = method(&store, DeliveryMode::Text, "555-111-1111").await;
    let b = method(&store, DeliveryMode::Voice, "555-222-2222").await;
    rule(&store, 0, "", a.id).await;
    rule(&store, 0, "", b.id).await;

    let channel = Arc::new(RecordingChannel::failing_for("+15551111111"));
    let report = engine(&store, &channel)
        .dispatch(&notification(Priority::High))
        .await;

    assert_eq!(
        report.outcomes,
        vec![(a.id, Outcome::Failed), (b.id, Outcome::Delivered)]
    );
}

#[tokio::test]
async fn unusable_methods_are_skipped() {
    let store = InMemoryStore::new();
    let email = method(&store, DeliveryMode::Email, "ops@example.net").await;
    let blank = method(&store, DeliveryMode::Text, "").await;
    let inactive = store
        .insert_method(CreateMethod {
            user_id: USER_ID,
            name: "old phone".to_string(),
            mode: DeliveryMode::Text,
            address: "555-333-3333".to_string(),
            preamble: String::new(),
            is_active: false,
        })
        .await;
    let gone = method(&store, DeliveryMode::Text, "555-444-4444").await;
    store.remove_method(gone.id).await;
    let good = method(&store, DeliveryMode::Text, "555-555-5555").await;
    for m in [&email, &blank, &inactive, &gone, &good] {
        rule(&store, 0, "", m.id).await;
    }

    let channel = Arc::new(RecordingChannel::default());
    let report = engine(&store, &channel)
        .dispatch(&notification(Priority::High))
        .await;

    assert_eq!(
        report.outcomes,
        vec![
            (email.id, Outcome::Skipped("email not supported")),
            (blank.id, Outcome::Skipped("no destination")),
            (inactive.id, Outcome::Skipped("method inactive")),
            (gone.id, Outcome::Skipped("method not found")),
            (good.id, Outcome::Delivered),
        ]
    );
}

#[tokio::test]
async fn missing_sending_number_skips_delivery() {
    let store = InMemoryStore::new();
    let m = method(&store, DeliveryMode::Text, "555-111-1111").await;
    rule(&store, 0, "", m.id).await;

    let channel = Arc::new(RecordingChannel::default());
    let engine = DispatchEngine::new(
        Arc::new(store.clone()),
        channel.clone(),
        ProviderCredentials::new("AC-site", "tok", ""),
    );
    let report = engine.dispatch(&notification(Priority::High)).await;

    assert_eq!(
        report.outcomes,
        vec![(m.id, Outcome::Skipped("no sending number"))]
    );
}

#[tokio::test]
async fn store_failure_dispatches_nothing() {
    let store = InMemoryStore::new();
    let m = method(&store, DeliveryMode::Text, "555-111-1111").await;
    rule(&store, 0, "", m.id).await;
    store.set_failing(true);

    let channel = Arc::new(RecordingChannel::default());
    let report = engine(&store, &channel)
        .dispatch(&notification(Priority::High))
        .await;

    assert!(report.outcomes.is_empty());
}

// ---------------------------------------------------------------------------
// Queue and workers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn workers_drain_queue_before_exiting() {
    let store = InMemoryStore::new();
    let m = method(&store, DeliveryMode::Text, "555-111-1111").await;
    rule(&store, 0, "", m.id).await;

    let channel = Arc::new(RecordingChannel::default());
    let (queue, receiver) = DispatchQueue::bounded(8);
    let pool = WorkerPool::spawn(Arc::new(engine(&store, &channel)), receiver, 3);
    assert_eq!(pool.len(), 3);

    for _ in 0..5 {
        queue.enqueue(notification(Priority::High)).await.unwrap();
    }
    drop(queue);

    assert!(pool.join(Duration::from_secs(5)).await);
    assert_eq!(channel.sent().len(), 5);
}

#[tokio::test]
async fn full_queue_makes_producer_wait() {
    let (queue, mut receiver) = DispatchQueue::bounded(1);
    queue.enqueue(notification(Priority::High)).await.unwrap();
    assert_eq!(queue.available(), 0);

    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        queue.enqueue(notification(Priority::High)),
    )
    .await;
    assert!(blocked.is_err(), "enqueue should wait while the queue is full");

    receiver.recv().await.unwrap();
    queue.enqueue(notification(Priority::High)).await.unwrap();
}

#[tokio::test]
async fn enqueue_after_receiver_dropped_fails() {
    let (queue, receiver) = DispatchQueue::bounded(4);
    drop(receiver);
    assert!(queue.enqueue(notification(Priority::High)).await.is_err());
}

#[tokio::test]
async fn reserved_slot_counts_against_capacity() {
    let (queue, mut receiver) = DispatchQueue::bounded(1);
    let permit = queue.reserve().await.unwrap();
    assert_eq!(queue.available(), 0);

    let second = tokio::time::timeout(Duration::from_millis(50), queue.reserve()).await;
    assert!(second.is_err(), "reserve should wait while the slot is held");

    permit.send(notification(Priority::High));
    assert_eq!(receiver.recv().await.unwrap().notid, "n-1");
    assert_eq!(queue.available(), 1);
}

#[tokio::test]
async fn dropped_permit_releases_slot() {
    let (queue, _receiver) = DispatchQueue::bounded(1);
    drop(queue.reserve().await.unwrap());
    assert_eq!(queue.available(), 1);
}

#[tokio::test]
async fn reserve_after_receiver_dropped_fails() {
    let (queue, receiver) = DispatchQueue::bounded(1);
    drop(receiver);
    assert!(queue.reserve().await.is_err());
}
