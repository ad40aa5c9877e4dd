//! Notification relay HTTP service.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! ingestion) so integration tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod router;
pub mod routes;
pub mod state;
