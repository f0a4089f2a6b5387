//! Axum router construction and role-based route mapping.
//!
//! The [`app`] function wires the routes for the node's configured role
//! and returns a ready-to-serve [`axum::Router`].  The leader exposes the
//! client write path; followers expose the replication entry point.  The
//! read path, store dump, banner, health probe, and metrics endpoint are
//! common to both roles.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::handlers;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the QuorumKV API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuorumKV",
        version = "0.1.0",
        description = "Replicated key-value store with quorum-based semi-synchronous replication"
    ),
    paths(
        handlers::service_info,
        handlers::health,
        handlers::read,
        handlers::all,
        handlers::leader::write,
        handlers::follower::replicate,
    ),
    tags(
        (name = "Node", description = "Node identity and health"),
        (name = "Store", description = "Local store reads"),
        (name = "Leader", description = "Client write path"),
        (name = "Follower", description = "Inbound replication"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] for this node's role.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let role = state.config.node.role;
    let observability = state.config.observability.clone();

    // Role-specific routes: only one of these is ever mounted, so a write
    // sent to a follower simply has no route (404).
    let mut router = if role.is_leader() {
        Router::new().route("/write", post(handlers::leader::write))
    } else {
        Router::new().route("/replicate", post(handlers::follower::replicate))
    };

    // Routes common to both roles.
    router = router
        .route("/", get(handlers::service_info))
        .route("/read/:key", get(handlers::read))
        .route("/all", get(handlers::all))
        .route("/openapi.json", get(openapi_spec));

    if observability.health_check {
        router = router.route("/health", get(handlers::health));
    }
    if observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    let mut router = router
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware));

    if observability.metrics {
        // metrics_middleware is outermost so it captures the full request
        // lifecycle.
        router = router.layer(middleware::from_fn(metrics_middleware));
    }

    router
}

// -- Common headers middleware -----------------------------------------------

/// Middleware that adds common response headers to every response:
/// - `x-request-id`: correlation ID (kept if a handler already set one)
/// - `Server`: `QuorumKV`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
    }
    headers.insert("server", HeaderValue::from_static("QuorumKV"));

    response
}

// -- OpenAPI endpoint ---------------------------------------------------------

/// `GET /openapi.json` -- Serve the generated OpenAPI document.
async fn openapi_spec() -> impl IntoResponse {
    match ApiDoc::openapi().to_json() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to render OpenAPI spec: {err}"),
        )
            .into_response(),
    }
}
