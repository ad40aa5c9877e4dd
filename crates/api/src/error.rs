use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use notif_core::envelope::EnvelopeError;
use notif_core::error::CoreError;
use notif_core::signature::VerificationError;
use notif_db::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of the envelope, verification and storage layers
/// and implements [`IntoResponse`] to produce consistent JSON error
/// responses. A rejection after the body was read is final; senders should
/// not retry it unchanged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `notif_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The submission body or envelope could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The envelope signature could not be verified.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The persistence backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Submission errors ---
            AppError::Envelope(err) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_ENVELOPE", err.to_string())
            }
            AppError::Verification(VerificationError::UnsupportedAlgorithm(alg)) => (
                StatusCode::NOT_FOUND,
                "UNSUPPORTED_ALGORITHM",
                format!("Unsupported signature algorithm: {alg}"),
            ),
            AppError::Verification(err) => {
                (StatusCode::FORBIDDEN, "SIGNATURE_REJECTED", err.to_string())
            }

            // --- Backend errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                internal()
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
