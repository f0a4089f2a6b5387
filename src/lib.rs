//! QuorumKV library — replicated key-value store engine.
//!
//! This crate provides the core components for running a single-leader,
//! multi-follower replicated key-value store: a versioned in-memory store
//! with last-writer-wins conflict resolution, a quorum-based replication
//! coordinator, and the HTTP shell that binds them to a node role.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod replication;
pub mod server;
pub mod store;

use crate::config::Config;
use crate::replication::{HttpTransport, Replicator};
use crate::store::VersionedStore;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Node configuration.
    pub config: Config,
    /// This node's versioned store.  Never shared across the network
    /// boundary; leader and followers coordinate by message passing only.
    pub store: Arc<VersionedStore>,
    /// Replication coordinator.  `Some` only on the leader.
    pub replicator: Option<Arc<Replicator<HttpTransport>>>,
}
