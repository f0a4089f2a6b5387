//! Wire types for the client and replication HTTP APIs.
//!
//! All payloads are JSON.  Values are opaque strings; the only structured
//! field is the `timestamp` the leader stamps onto every write, which is
//! what followers use for last-writer-wins conflict resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Client write request (`POST /write`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WriteRequest {
    /// Key to write.
    pub key: String,
    /// Opaque value.
    pub value: String,
}

/// Client write response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WriteResponse {
    /// Whether the write reached its quorum.
    pub success: bool,
    /// Human-readable summary of the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of followers that acknowledged the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicated_count: Option<usize>,
}

/// Client read response (`GET /read/{key}`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadResponse {
    /// Whether the key was found.
    pub success: bool,
    /// The key that was requested.
    pub key: String,
    /// The current value, when found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Error detail, when not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Leader-to-follower replication request (`POST /replicate`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationRequest {
    /// Key to replicate.
    pub key: String,
    /// Opaque value.
    pub value: String,
    /// Leader-assigned wall-clock timestamp, fractional seconds.
    pub timestamp: f64,
}

/// Follower acknowledgment for a replication request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationAck {
    /// Whether the follower accepted the request.
    pub success: bool,
    /// Identity of the acknowledging follower.
    pub follower_id: String,
}

/// Full store dump (`GET /all`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllDataResponse {
    /// Always `true`; dumps cannot fail.
    pub success: bool,
    /// Point-in-time copy of every key and its current value.
    pub data: HashMap<String, String>,
    /// Number of keys in `data`.
    pub count: usize,
}

/// Health probe payload (`GET /health`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process is serving.
    pub status: String,
    /// Node role: `leader` or `follower`.
    pub role: String,
    /// This node's identifier.
    pub node_id: String,
    /// Configured write quorum (leader only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_quorum: Option<usize>,
    /// Number of configured followers (leader only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<usize>,
}

/// Service banner (`GET /`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// Service name.
    pub service: String,
    /// This node's identifier.
    pub node_id: String,
    /// Node role: `leader` or `follower`.
    pub role: String,
    /// Always `"running"`.
    pub status: String,
}
