//! Configuration loading and types for QuorumKV.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Each subsection governs a different part of the
//! system: node identity and networking, replication fan-out, logging,
//! and observability.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Node identity and HTTP listener settings.
    #[serde(default)]
    pub node: NodeConfig,

    /// Replication fan-out settings (meaningful on the leader).
    #[serde(default)]
    pub replication: ReplicationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings (metrics + health probes).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// The role a node plays in the replication topology.
///
/// Exactly one leader is configured out-of-band; everything else is a
/// follower.  There is no election or failover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Accepts client writes and fans them out to followers.
    Leader,
    /// Accepts replication calls from the leader.
    #[default]
    Follower,
}

impl Role {
    /// Whether this node is the leader.
    pub fn is_leader(self) -> bool {
        matches!(self, Role::Leader)
    }

    /// Lowercase role name for logs and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
        }
    }
}

/// Node identity and HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// This node's unique identifier.
    #[serde(default = "default_node_id")]
    pub id: String,

    /// Role: `leader` or `follower`.
    #[serde(default)]
    pub role: Role,

    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: default_node_id(),
            role: Role::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Replication fan-out configuration.
///
/// Only the leader reads these; followers ignore the section entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationConfig {
    /// Base URLs of every follower, e.g. `http://127.0.0.1:8001`.
    #[serde(default)]
    pub followers: Vec<String>,

    /// Minimum follower acknowledgments required to commit a write.
    #[serde(default = "default_write_quorum")]
    pub write_quorum: usize,

    /// Lower bound of the simulated per-attempt network delay, in ms.
    /// Set both bounds to zero outside latency experiments.
    #[serde(default)]
    pub min_delay_ms: u64,

    /// Upper bound of the simulated per-attempt network delay, in ms.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-attempt HTTP request timeout in seconds.  Bounds orphaned
    /// attempts that keep running after the coordinator has returned.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            followers: Vec::new(),
            write_quorum: default_write_quorum(),
            min_delay_ms: 0,
            max_delay_ms: default_max_delay_ms(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
///
/// Controls Prometheus metrics collection and the health probe endpoint.
/// Both are enabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and the `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,

    /// Enable the `/health` probe endpoint.
    #[serde(default = "default_true")]
    pub health_check: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics: true,
            health_check: true,
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_node_id() -> String {
    format!("node-{}", uuid::Uuid::new_v4().simple())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_write_quorum() -> usize {
    1
}

fn default_max_delay_ms() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
///
/// Rejects a delay range whose lower bound exceeds its upper bound.  A
/// quorum larger than the follower count is accepted but warned about,
/// since such a quorum can never be met.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> anyhow::Result<()> {
    let repl = &config.replication;
    if repl.min_delay_ms > repl.max_delay_ms {
        anyhow::bail!(
            "replication.min_delay_ms ({}) exceeds replication.max_delay_ms ({})",
            repl.min_delay_ms,
            repl.max_delay_ms
        );
    }
    if config.node.role.is_leader() && repl.write_quorum > repl.followers.len() {
        tracing::warn!(
            "write_quorum ({}) exceeds follower count ({}): no write can ever commit",
            repl.write_quorum,
            repl.followers.len()
        );
    }
    Ok(())
}

// -- Tests --------------------------------------------------------------------
