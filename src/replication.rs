//! Quorum-based semi-synchronous replication coordinator.
//!
//! The leader hands every write to a [`Replicator`], which fans one
//! replication attempt out to each configured follower concurrently and
//! counts acknowledgments as they arrive.  The moment the count reaches
//! the write quorum the coordinator returns, leaving the remaining
//! attempts to finish on their own; if the quorum cannot be met it waits
//! for every attempt to resolve before reporting failure.
//!
//! That asymmetry is the latency property the system exists to exhibit:
//! a committed write costs the quorum-th fastest follower round trip,
//! an uncommittable one costs the slowest.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ReplicationAck, ReplicationRequest};
use crate::metrics::{REPLICATION_ATTEMPTS_TOTAL, REPLICATION_DURATION_SECONDS};

/// Result of coordinating one write across the follower set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Whether the acknowledged count reached the quorum.
    pub committed: bool,
    /// Followers that acknowledged before the decision was reached.
    pub acknowledged: usize,
}

/// Transport used to deliver one replication request to one follower.
///
/// The seam exists so the coordination logic can be exercised without a
/// network; production uses [`HttpTransport`].
pub trait FollowerTransport: Send + Sync + 'static {
    /// Deliver `request` to the follower at `follower_url`.
    ///
    /// An `Err` means the attempt failed (unreachable, non-success
    /// status, or timeout).  Failed attempts are never retried.
    fn send(
        &self,
        follower_url: &str,
        request: ReplicationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReplicationAck>> + Send + 'static>>;
}

/// HTTP transport: `POST {follower_url}/replicate` with a JSON body.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport with a shared client and a per-request timeout.
    ///
    /// The timeout also bounds attempts orphaned by an early quorum exit,
    /// so they cannot run forever.
    pub fn new(request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

impl FollowerTransport for HttpTransport {
    fn send(
        &self,
        follower_url: &str,
        request: ReplicationRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReplicationAck>> + Send + 'static>> {
        let url = format!("{}/replicate", follower_url.trim_end_matches('/'));
        let client = self.client.clone();
        Box::pin(async move {
            let response = client.post(&url).json(&request).send().await?;
            if !response.status().is_success() {
                anyhow::bail!("follower returned {}", response.status());
            }
            let ack: ReplicationAck = response.json().await?;
            Ok(ack)
        })
    }
}

/// Replication coordinator owned by the leader role.
///
/// Holds the read-only follower set and delay configuration for its whole
/// lifetime.  Every call to [`replicate`](Self::replicate) is independent;
/// the coordinator keeps no per-write state between calls.
pub struct Replicator<T: FollowerTransport> {
    followers: Vec<String>,
    min_delay: Duration,
    max_delay: Duration,
    transport: Arc<T>,
}

impl<T: FollowerTransport> Replicator<T> {
    /// Create a coordinator over `followers`.
    ///
    /// Each attempt sleeps a uniform random duration in
    /// `[min_delay, max_delay]` before sending, a fault-injection knob for
    /// latency experiments.  Pass zero for both in real deployments.
    pub fn new(
        followers: Vec<String>,
        min_delay: Duration,
        max_delay: Duration,
        transport: T,
    ) -> Self {
        Self {
            followers,
            min_delay,
            max_delay,
            transport: Arc::new(transport),
        }
    }

    /// Number of configured followers.
    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }

    /// Fan a write out to every follower and decide it against `quorum`.
    ///
    /// Returns as soon as the outcome is knowable:
    /// - the acknowledged count reaches `quorum` (early exit; outstanding
    ///   attempts keep running detached and their results are discarded), or
    /// - every attempt has resolved and the count still falls short.
    ///
    /// With no followers configured, or `quorum == 0`, the quorum is
    /// trivially satisfied and this returns immediately.  A `quorum`
    /// larger than the follower set can never be met, so every such call
    /// waits for all attempts and reports `committed = false`.
    ///
    /// Per-attempt failures are absorbed into the count; this method
    /// never errors on follower failure.
    pub async fn replicate(
        &self,
        key: &str,
        value: &str,
        timestamp: f64,
        quorum: usize,
    ) -> WriteOutcome {
        if self.followers.is_empty() {
            return WriteOutcome {
                committed: true,
                acknowledged: 0,
            };
        }

        let start = std::time::Instant::now();
        let (tx, mut rx) = mpsc::channel::<bool>(self.followers.len());

        for follower_url in &self.followers {
            let delay = self.draw_delay();
            let request = ReplicationRequest {
                key: key.to_string(),
                value: value.to_string(),
                timestamp,
            };
            let transport = self.transport.clone();
            let tx = tx.clone();
            let url = follower_url.clone();

            // Detached on purpose: after an early quorum exit the receiver
            // is gone and the send below fails silently, but the follower
            // still applies the write.  The transport timeout bounds how
            // long an orphaned attempt can live.
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let acked = match transport.send(&url, request).await {
                    Ok(ack) => {
                        debug!(follower = %ack.follower_id, "replication acknowledged");
                        ack.success
                    }
                    Err(err) => {
                        warn!(follower_url = %url, error = %err, "replication attempt failed");
                        false
                    }
                };
                metrics::counter!(
                    REPLICATION_ATTEMPTS_TOTAL,
                    "outcome" => if acked { "acknowledged" } else { "failed" }
                )
                .increment(1);
                let _ = tx.send(acked).await;
            });
        }
        // Drop the original sender so the channel closes once every
        // attempt has reported.
        drop(tx);

        let mut acknowledged = 0;
        let mut outcome = WriteOutcome {
            committed: quorum == 0,
            acknowledged: 0,
        };

        if !outcome.committed {
            // Observe completions one at a time, in arrival order.
            while let Some(acked) = rx.recv().await {
                if acked {
                    acknowledged += 1;
                    if acknowledged >= quorum {
                        outcome = WriteOutcome {
                            committed: true,
                            acknowledged,
                        };
                        break;
                    }
                }
            }
            if !outcome.committed {
                // Channel exhausted: every attempt resolved short of quorum.
                outcome = WriteOutcome {
                    committed: false,
                    acknowledged,
                };
            }
        }

        metrics::histogram!(REPLICATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        outcome
    }

    fn draw_delay(&self) -> Duration {
        if self.max_delay.is_zero() {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_delay.as_millis()..=self.max_delay.as_millis());
        Duration::from_millis(ms as u64)
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Scripted follower behavior for one mock transport.
    #[derive(Clone, Copy)]
    struct Script {
        delay_ms: u64,
        succeed: bool,
    }

    /// Mock transport that resolves each follower according to a script.
    struct MockTransport {
        scripts: HashMap<String, Script>,
        calls: Arc<AtomicUsize>,
    }

    impl MockTransport {
        fn new(scripts: Vec<(&str, u64, bool)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(url, delay_ms, succeed)| {
                        (url.to_string(), Script { delay_ms, succeed })
                    })
                    .collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FollowerTransport for MockTransport {
        fn send(
            &self,
            follower_url: &str,
            _request: ReplicationRequest,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<ReplicationAck>> + Send + 'static>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts[follower_url];
            let id = follower_url.to_string();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
                if script.succeed {
                    Ok(ReplicationAck {
                        success: true,
                        follower_id: id,
                    })
                } else {
                    anyhow::bail!("connection refused")
                }
            })
        }
    }

    fn replicator(scripts: Vec<(&str, u64, bool)>) -> Replicator<MockTransport> {
        let followers = scripts.iter().map(|(url, _, _)| url.to_string()).collect();
        Replicator::new(
            followers,
            Duration::ZERO,
            Duration::ZERO,
            MockTransport::new(scripts),
        )
    }

    #[tokio::test]
    async fn test_empty_followers_trivially_commit() {
        let replicator = replicator(vec![]);
        let outcome = replicator.replicate("k", "v", 1.0, 0).await;
        assert_eq!(
            outcome,
            WriteOutcome {
                committed: true,
                acknowledged: 0
            }
        );
        // No follower set, no network calls.
        assert_eq!(replicator.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_followers_ignore_quorum() {
        let replicator = replicator(vec![]);
        let outcome = replicator.replicate("k", "v", 1.0, 3).await;
        assert!(outcome.committed);
        assert_eq!(outcome.acknowledged, 0);
    }

    #[tokio::test]
    async fn test_zero_quorum_returns_without_waiting() {
        let replicator = replicator(vec![("f1", 2000, true)]);
        let start = Instant::now();
        let outcome = replicator.replicate("k", "v", 1.0, 0).await;
        assert!(outcome.committed);
        assert_eq!(outcome.acknowledged, 0);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_all_followers_ack() {
        let replicator = replicator(vec![("f1", 5, true), ("f2", 5, true), ("f3", 5, true)]);
        let outcome = replicator.replicate("k", "v", 1.0, 3).await;
        assert!(outcome.committed);
        assert_eq!(outcome.acknowledged, 3);
    }

    #[tokio::test]
    async fn test_early_exit_at_quorum() {
        // Third follower is far slower than the quorum decision should be.
        let replicator = replicator(vec![
            ("f1", 10, true),
            ("f2", 50, true),
            ("f3", 5000, true),
        ]);
        let start = Instant::now();
        let outcome = replicator.replicate("k", "v", 1.0, 2).await;
        let elapsed = start.elapsed();

        assert!(outcome.committed);
        assert_eq!(outcome.acknowledged, 2);
        // Bounded by the 2nd-fastest follower, not the slow straggler.
        assert!(
            elapsed < Duration::from_millis(1000),
            "early exit took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_quorum_unmet_waits_for_all_attempts() {
        let replicator = replicator(vec![
            ("f1", 5, false),
            ("f2", 5, false),
            ("f3", 100, true),
        ]);
        let start = Instant::now();
        let outcome = replicator.replicate("k", "v", 1.0, 2).await;
        let elapsed = start.elapsed();

        assert!(!outcome.committed);
        assert_eq!(outcome.acknowledged, 1);
        // Must not report failure before the slowest attempt resolves.
        assert!(
            elapsed >= Duration::from_millis(100),
            "returned too early: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_quorum_larger_than_follower_set_never_commits() {
        let replicator = replicator(vec![("f1", 5, true), ("f2", 5, true)]);
        let outcome = replicator.replicate("k", "v", 1.0, 3).await;
        assert!(!outcome.committed);
        assert_eq!(outcome.acknowledged, 2);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let replicator = replicator(vec![("f1", 5, false), ("f2", 5, true)]);
        let outcome = replicator.replicate("k", "v", 1.0, 1).await;
        assert!(outcome.committed);
        assert_eq!(outcome.acknowledged, 1);
    }

    #[tokio::test]
    async fn test_orphaned_attempts_still_run() {
        let calls;
        {
            let replicator = replicator(vec![("f1", 5, true), ("f2", 150, true)]);
            calls = replicator.transport.calls.clone();
            let outcome = replicator.replicate("k", "v", 1.0, 1).await;
            assert!(outcome.committed);
            assert_eq!(outcome.acknowledged, 1);
        }
        // Both attempts were dispatched even though the coordinator
        // returned after the first acknowledgment.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
