//! HTTP handlers, grouped by node role.
//!
//! Leader and follower share the read path; writes only exist on the
//! leader and inbound replication only on followers.

pub mod follower;
pub mod leader;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::api::{AllDataResponse, HealthResponse, ReadResponse, ServiceInfo};
use crate::errors::KvError;
use crate::AppState;

/// `GET /` -- Service banner with node identity and role.
#[utoipa::path(
    get,
    path = "/",
    tag = "Node",
    operation_id = "ServiceInfo",
    responses((status = 200, description = "Service banner", body = ServiceInfo))
)]
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "QuorumKV".to_string(),
        node_id: state.config.node.id.clone(),
        role: state.config.node.role.as_str().to_string(),
        status: "running".to_string(),
    })
}

/// `GET /health` -- Role-specific health payload.
///
/// The leader reports its quorum and follower count so the test harness
/// can verify topology; followers report identity only.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Node",
    operation_id = "HealthCheck",
    responses((status = 200, description = "Health check OK", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let role = state.config.node.role;
    let (write_quorum, followers) = if role.is_leader() {
        (
            Some(state.config.replication.write_quorum),
            Some(state.config.replication.followers.len()),
        )
    } else {
        (None, None)
    };
    Json(HealthResponse {
        status: "healthy".to_string(),
        role: role.as_str().to_string(),
        node_id: state.config.node.id.clone(),
        write_quorum,
        followers,
    })
}

/// `GET /read/{key}` -- Read from the local store.
///
/// Available on both roles; a follower read may trail the leader until
/// replication catches up.
#[utoipa::path(
    get,
    path = "/read/{key}",
    tag = "Store",
    operation_id = "ReadKey",
    params(("key" = String, Path, description = "Key to read")),
    responses(
        (status = 200, description = "Current value", body = ReadResponse),
        (status = 404, description = "Key not found")
    )
)]
pub async fn read(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ReadResponse>, KvError> {
    match state.store.get(&key).await {
        Some(value) => Ok(Json(ReadResponse {
            success: true,
            key,
            value: Some(value),
            message: None,
        })),
        None => Err(KvError::KeyNotFound { key }),
    }
}

/// `GET /all` -- Point-in-time dump of the local store.
#[utoipa::path(
    get,
    path = "/all",
    tag = "Store",
    operation_id = "DumpStore",
    responses((status = 200, description = "All key-value pairs", body = AllDataResponse))
)]
pub async fn all(State(state): State<Arc<AppState>>) -> Json<AllDataResponse> {
    let data = state.store.snapshot().await;
    let count = data.len();
    Json(AllDataResponse {
        success: true,
        data,
        count,
    })
}
