//! Shared harness for the HTTP integration tests.
//!
//! The app runs against [`InMemoryStore`] and a static DNS table that
//! publishes the fixture key at `sel1._domainkey.sender.example`. Accepted
//! notifications land on a queue whose receiver the test holds.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use notif_core::dkim::KeyResolver;
use notif_core::dns::StaticTxtLookup;
use notif_core::envelope::{NotificationPayload, ProtectedHeader, SigningInput, SubmissionBody};
use notif_core::priority::Priority;
use notif_core::signature::SignatureVerifier;
use notif_core::types::Timestamp;
use notif_db::models::authorization::CreateAuthorization;
use notif_db::models::notification::Notification;
use notif_db::InMemoryStore;
use notif_dispatch::DispatchQueue;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use tokio::sync::mpsc;
use tower::ServiceExt;

use notif_api::config::ServerConfig;
use notif_api::ingest::IngestService;
use notif_api::router::build_app_router;
use notif_api::state::AppState;

pub const SIGNER_DOMAIN: &str = "sender.example";
pub const SELECTOR: &str = "sel1";
pub const ADDRESS: &str = "addr-1";
pub const USER_ID: i64 = 7;

const SIGNER_PEM: &str = include_str!("../fixtures/signer_rsa.pem");
const SIGNER_PUB: &str = include_str!("../fixtures/signer_rsa.pub.b64");

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        dispatch_queue_capacity: 64,
        dispatch_workers: 1,
        twilio_api_base: "http://127.0.0.1:9".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    /// Receives everything the service queued for dispatch.
    pub dispatched: mpsc::Receiver<Notification>,
}

impl TestApp {
    /// App with one active authorization at [`ADDRESS`] allowing every
    /// priority.
    pub async fn new() -> Self {
        let app = Self::empty();
        app.store
            .insert_authorization(authorization(ADDRESS, Priority::Emergency))
            .await;
        app
    }

    /// App with no authorizations.
    pub fn empty() -> Self {
        Self::with_config(test_config())
    }

    /// App with no authorizations, built from `config`.
    pub fn with_config(config: ServerConfig) -> Self {
        let store = InMemoryStore::new();
        let lookup = StaticTxtLookup::new().with_record(
            format!("{SELECTOR}._domainkey.{SIGNER_DOMAIN}"),
            format!("v=DKIM1; k=rsa; p={}", SIGNER_PUB.trim()),
        );
        let verifier = SignatureVerifier::new(KeyResolver::new(Arc::new(lookup)));

        let (queue, dispatched) = DispatchQueue::bounded(config.dispatch_queue_capacity);
        let state = AppState {
            store: Arc::new(store.clone()),
            config: Arc::new(config.clone()),
            ingest: IngestService::new(Arc::new(store.clone()), verifier, queue),
        };

        Self {
            router: build_app_router(state, &config),
            store,
            dispatched,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: impl Into<Body>) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Method::GET, uri, Body::empty()).await
    }

    /// Create a notification and return its id.
    pub async fn create(&self, payload: &NotificationPayload) -> String {
        let response = self
            .send(Method::POST, &format!("/notify/{ADDRESS}"), signed(payload))
            .await;
        assert_eq!(response.status(), 200, "create failed");
        body_json(response).await["notid"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Everything queued for dispatch so far.
    pub fn drain_dispatched(&mut self) -> Vec<Notification> {
        let mut queued = Vec::new();
        while let Ok(n) = self.dispatched.try_recv() {
            queued.push(n);
        }
        queued
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn authorization(address: &str, max_priority: Priority) -> CreateAuthorization {
    CreateAuthorization {
        address: address.to_string(),
        user_id: USER_ID,
        domain: SIGNER_DOMAIN.to_string(),
        description: "Ops monitoring".to_string(),
        max_priority,
        is_active: true,
    }
}

pub fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn payload(priority: Priority, origination_time: Timestamp) -> NotificationPayload {
    NotificationPayload {
        to: ADDRESS.to_string(),
        origination_time,
        priority,
        expires_at: origination_time + Duration::days(1),
        subject: "Disk full".to_string(),
        body: "db-1 at 99%".to_string(),
    }
}

fn signer_key() -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(SIGNER_PEM).unwrap()
}

/// Compact envelope signed with the fixture key under `alg` and `selector`.
pub fn compact(payload: &NotificationPayload, alg: &str, selector: &str) -> String {
    let header = ProtectedHeader {
        algorithm: alg.to_string(),
        selector: selector.to_string(),
    };
    SigningInput::new(&header, payload)
        .unwrap()
        .seal_rs256(&signer_key())
        .unwrap()
}

/// JSON request body around a compact envelope.
pub fn submission(compact: String) -> Vec<u8> {
    serde_json::to_vec(&SubmissionBody::new(compact)).unwrap()
}

/// Correctly signed request body for `payload`.
pub fn signed(payload: &NotificationPayload) -> Vec<u8> {
    submission(compact(payload, "RS256", SELECTOR))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
