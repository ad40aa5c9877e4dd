//! Route definitions for the notification collection.
//!
//! The same key segment is an authorization address for POST and a
//! notification id for PUT and DELETE. The `/notify` prefix is optional.
//!
//! ```text
//! POST   /notify/{key}    create
//! PUT    /notify/{key}    revise
//! DELETE /notify/{key}    remove
//! ```
//!
//! Any other method gets 405 with an `Allow` header before the body is read.

use axum::routing::post;
use axum::Router;

use crate::handlers::notify;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let collection = post(notify::create)
        .put(notify::revise)
        .delete(notify::remove);

    Router::new()
        .route("/notify/{key}", collection.clone())
        .route("/{key}", collection)
}
