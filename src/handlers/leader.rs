//! Leader-only handlers: the client write path.
//!
//! A write is stamped with the leader's wall clock, applied to the local
//! store, and fanned out to the follower set.  The client answer depends
//! only on whether the quorum was met; followers that miss the write are
//! left permanently behind (no retry, no read repair).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::api::{WriteRequest, WriteResponse};
use crate::errors::KvError;
use crate::metrics::WRITES_TOTAL;
use crate::AppState;

/// `POST /write` -- Accept a client write and replicate it.
///
/// The write is applied locally before fan-out, and stays applied even
/// when the quorum is missed -- a failed write is visible at the leader
/// and at every follower that acknowledged it.
#[utoipa::path(
    post,
    path = "/write",
    tag = "Leader",
    operation_id = "Write",
    request_body = WriteRequest,
    responses(
        (status = 200, description = "Write committed", body = WriteResponse),
        (status = 503, description = "Write failed to meet quorum")
    )
)]
pub async fn write(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<WriteResponse>, KvError> {
    let replicator = state.replicator.as_ref().ok_or(KvError::NotLeader)?;
    let quorum = state.config.replication.write_quorum;

    // Leader wall clock, fractional seconds.  Every follower receives
    // this exact timestamp, which is what makes LWW deterministic.
    let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

    state.store.set(&request.key, &request.value, timestamp).await;

    let outcome = replicator
        .replicate(&request.key, &request.value, timestamp, quorum)
        .await;

    metrics::counter!(
        WRITES_TOTAL,
        "committed" => if outcome.committed { "true" } else { "false" }
    )
    .increment(1);

    if outcome.committed {
        info!(
            key = %request.key,
            acknowledged = outcome.acknowledged,
            "write committed"
        );
        Ok(Json(WriteResponse {
            success: true,
            message: Some(format!(
                "Write successful, replicated to {} followers",
                outcome.acknowledged
            )),
            replicated_count: Some(outcome.acknowledged),
        }))
    } else {
        info!(
            key = %request.key,
            acknowledged = outcome.acknowledged,
            required = quorum,
            "write missed quorum"
        );
        Err(KvError::QuorumNotReached {
            required: quorum,
            acknowledged: outcome.acknowledged,
        })
    }
}
