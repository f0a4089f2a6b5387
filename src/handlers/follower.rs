//! Follower-only handlers: the inbound replication path.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::api::{ReplicationAck, ReplicationRequest};
use crate::AppState;

/// `POST /replicate` -- Apply a replicated write from the leader.
///
/// Always acknowledges success: a stale write (older or equal timestamp)
/// is a deliberate no-op, not a failure, so redelivery stays idempotent
/// and the leader's acknowledged count is not distorted by LWW drops.
#[utoipa::path(
    post,
    path = "/replicate",
    tag = "Follower",
    operation_id = "Replicate",
    request_body = ReplicationRequest,
    responses((status = 200, description = "Replication acknowledged", body = ReplicationAck))
)]
pub async fn replicate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReplicationRequest>,
) -> Json<ReplicationAck> {
    let applied = state
        .store
        .set(&request.key, &request.value, request.timestamp)
        .await;

    debug!(
        key = %request.key,
        timestamp = request.timestamp,
        applied,
        "replication request applied"
    );

    Json(ReplicationAck {
        success: true,
        follower_id: state.config.node.id.clone(),
    })
}
