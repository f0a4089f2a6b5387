//! QuorumKV -- replicated key-value store node.
//!
//! One binary serves both roles: the configured role decides which routes
//! are mounted and whether a replication coordinator is constructed.
//! State is memory-only; a restart starts empty.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use quorumkv::replication::{HttpTransport, Replicator};
use quorumkv::store::VersionedStore;

/// Command-line arguments for the QuorumKV node.
#[derive(Parser, Debug)]
#[command(
    name = "quorumkv",
    version,
    about = "Replicated key-value store with quorum-based semi-synchronous replication"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "quorumkv.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing / logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config);
    let config = quorumkv::config::load_config(&cli.config)?;

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.node.host, config.node.port));

    if config.observability.metrics {
        quorumkv::metrics::init_metrics();
        quorumkv::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let store = Arc::new(VersionedStore::new());

    // Only the leader fans writes out; followers just apply what arrives.
    let replicator = if config.node.role.is_leader() {
        let repl = &config.replication;
        info!(
            "Starting LEADER node {}: quorum={} followers={:?} delay=[{}ms, {}ms]",
            config.node.id, repl.write_quorum, repl.followers, repl.min_delay_ms, repl.max_delay_ms
        );
        let transport = HttpTransport::new(Duration::from_secs(repl.request_timeout_secs))?;
        Some(Arc::new(Replicator::new(
            repl.followers.clone(),
            Duration::from_millis(repl.min_delay_ms),
            Duration::from_millis(repl.max_delay_ms),
            transport,
        )))
    } else {
        info!("Starting FOLLOWER node {}", config.node.id);
        None
    };

    let state = Arc::new(quorumkv::AppState {
        config,
        store,
        replicator,
    });

    let app = quorumkv::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("QuorumKV listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections
    // and let in-flight requests finish.  All state is lost on exit.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("QuorumKV shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
