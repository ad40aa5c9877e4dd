//! Handlers for the notification collection.
//!
//! The body is taken as raw bytes so that a malformed outer JSON document
//! is reported as an envelope error rather than by the JSON extractor.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub notid: String,
}

/// POST /notify/{address}
pub async fn create(
    State(state): State<AppState>,
    Path(address): Path<String>,
    body: Bytes,
) -> AppResult<Json<CreatedResponse>> {
    let notid = state.ingest.create(&address, &body).await?;
    Ok(Json(CreatedResponse { notid }))
}

/// PUT /notify/{notid}
pub async fn revise(
    State(state): State<AppState>,
    Path(notid): Path<String>,
    body: Bytes,
) -> AppResult<StatusCode> {
    state.ingest.revise(&notid, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /notify/{notid}
pub async fn remove(
    State(state): State<AppState>,
    Path(notid): Path<String>,
    body: Bytes,
) -> AppResult<StatusCode> {
    state.ingest.delete(&notid, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}
