use std::sync::Arc;

use notif_db::Store;

use crate::config::ServerConfig;
use crate::ingest::IngestService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend.
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    /// Submission lifecycle. Holds the dispatch queue's producer handle.
    pub ingest: IngestService,
}
