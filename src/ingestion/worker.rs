use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{db::EventStore, error::QueryError, ingestion::EventFeed, models::ClickEvent};

/// Backoff applied after feed failures and failed store appends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RestartPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time, capped
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }
}

/// Counters reported when the worker stops
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionStats {
    /// Events decoded and appended to the store
    pub consumed: u64,
    pub decode_errors: u64,
    pub feed_errors: u64,
    pub store_retries: u64,
    /// Most recent payload that failed to decode, as a `DecodeError`
    pub last_decode_error: Option<QueryError>,
}

/// Handle for stopping a running ingestion worker
pub struct IngestionHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<IngestionStats>,
}

impl IngestionHandle {
    /// Signals the worker to stop and waits for its final counters
    pub async fn shutdown(self) -> IngestionStats {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Ingestion worker shutdown signal sent");
        self.join().await
    }

    /// Waits for the worker to stop on its own (feed closed)
    pub async fn join(self) -> IngestionStats {
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Ingestion worker task failed");
                IngestionStats::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Supervised task that drains an [`EventFeed`] into an [`EventStore`]
///
/// Undecodable payloads are logged and skipped. Feed failures back off per the
/// [`RestartPolicy`] and resume. A decoded event only counts as consumed once the
/// append succeeds; failed appends are retried until they succeed or shutdown
/// is requested.
pub struct IngestionWorker<F> {
    feed: F,
    store: Arc<dyn EventStore>,
    policy: RestartPolicy,
    stats: IngestionStats,
}

impl<F: EventFeed + 'static> IngestionWorker<F> {
    pub fn spawn(feed: F, store: Arc<dyn EventStore>, policy: RestartPolicy) -> IngestionHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let worker = Self {
            feed,
            store,
            policy,
            stats: IngestionStats::default(),
        };
        let task = tokio::spawn(worker.run(shutdown_rx));
        IngestionHandle { shutdown_tx, task }
    }

    async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> IngestionStats {
        tracing::info!(
            feed = self.feed.name(),
            store = self.store.name(),
            "Ingestion worker started"
        );
        let mut failures = 0u32;

        loop {
            let next = tokio::select! {
                _ = shutdown_rx.recv() => break,
                next = self.feed.next_payload() => next,
            };

            match next {
                Ok(Some(payload)) => {
                    failures = 0;
                    if !self.ingest(&payload, &mut shutdown_rx).await {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!(feed = self.feed.name(), "Ingestion feed closed");
                    break;
                }
                Err(e) => {
                    failures += 1;
                    self.stats.feed_errors += 1;
                    let delay = self.policy.delay(failures);
                    tracing::error!(
                        error = %e,
                        attempt = failures,
                        backoff_ms = delay.as_millis() as u64,
                        "Ingestion feed failed, restarting after backoff"
                    );
                    if !sleep_or_shutdown(delay, &mut shutdown_rx).await {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            consumed = self.stats.consumed,
            decode_errors = self.stats.decode_errors,
            feed_errors = self.stats.feed_errors,
            store_retries = self.stats.store_retries,
            "Ingestion worker stopped"
        );
        self.stats
    }

    /// Decodes and stores one payload. Returns `false` if shutdown interrupted it.
    async fn ingest(&mut self, payload: &str, shutdown_rx: &mut mpsc::Receiver<()>) -> bool {
        let event = match ClickEvent::from_payload(payload) {
            Ok(event) => event,
            Err(e) => {
                let error = QueryError::decode_error(&e);
                self.stats.decode_errors += 1;
                tracing::warn!(
                    kind = ?error.kind,
                    error = %error.message,
                    payload = %payload,
                    "Skipping undecodable click event"
                );
                self.stats.last_decode_error = Some(error);
                return true;
            }
        };

        let mut attempt = 0u32;
        loop {
            match self.store.append(&event).await {
                Ok(()) => {
                    self.stats.consumed += 1;
                    tracing::debug!(product = %event.product_name, "Click event stored");
                    return true;
                }
                Err(e) => {
                    attempt += 1;
                    self.stats.store_retries += 1;
                    let delay = self.policy.delay(attempt);
                    tracing::error!(
                        error = %e,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        "Failed to store click event, retrying"
                    );
                    if !sleep_or_shutdown(delay, shutdown_rx).await {
                        tracing::warn!(product = %event.product_name, "Shutdown before click event was stored");
                        return false;
                    }
                }
            }
        }
    }
}

/// Sleeps for `delay`; returns `false` if a shutdown signal arrived first
async fn sleep_or_shutdown(delay: Duration, shutdown_rx: &mut mpsc::Receiver<()>) -> bool {
    tokio::select! {
        _ = shutdown_rx.recv() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RestartPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1000),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_millis(1000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_default_policy() {
        let policy = RestartPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.max_backoff, Duration::from_secs(30));
    }
}
