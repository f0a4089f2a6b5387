//! Error types for the QuorumKV HTTP surface.
//!
//! Every variant maps to a stable error code and HTTP status.  The enum
//! implements [`axum::response::IntoResponse`] so handlers can simply
//! return `Err(KvError::KeyNotFound { .. })` and get a JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Generate a request ID for response correlation.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Client-visible errors.
#[derive(Debug, Error)]
pub enum KvError {
    /// The requested key has no entry in the store.
    #[error("Key not found")]
    KeyNotFound { key: String },

    /// A write was sent to a node that is not the leader.
    #[error("Write operations are only allowed on the leader")]
    NotLeader,

    /// A write could not gather enough follower acknowledgments.
    ///
    /// The write stays applied at the leader and at whichever followers
    /// did acknowledge; there is no rollback.
    #[error("Write failed to meet quorum. Required: {required}, Achieved: {acknowledged}")]
    QuorumNotReached { required: usize, acknowledged: usize },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl KvError {
    /// Stable error code string for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            KvError::KeyNotFound { .. } => "KeyNotFound",
            KvError::NotLeader => "NotLeader",
            KvError::QuorumNotReached { .. } => "QuorumNotReached",
            KvError::Internal(_) => "InternalError",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            KvError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            KvError::NotLeader => StatusCode::FORBIDDEN,
            KvError::QuorumNotReached { .. } => StatusCode::SERVICE_UNAVAILABLE,
            KvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();

        let mut body = json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
            "request_id": request_id,
        });

        // Carry structured context where the caller can act on it.
        match &self {
            KvError::KeyNotFound { key } => {
                body["key"] = json!(key);
            }
            KvError::QuorumNotReached {
                required,
                acknowledged,
            } => {
                body["required"] = json!(required);
                body["replicated_count"] = json!(acknowledged);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

// -- Tests --------------------------------------------------------------------
