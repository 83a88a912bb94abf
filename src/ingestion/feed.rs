use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Ordered source of raw event payloads
#[async_trait::async_trait]
pub trait EventFeed: Send {
    /// Waits for the next payload. `Ok(None)` means the feed is closed for good.
    async fn next_payload(&mut self) -> AppResult<Option<String>>;

    /// Feed name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Feed backed by a Redis list that producers `LPUSH` onto
///
/// Each poll is a `BRPOP` bounded by `poll_timeout`; empty polls are retried
/// silently. A failed command drops the connection so the next call reconnects.
pub struct RedisListFeed {
    client: Client,
    key: String,
    poll_timeout: Duration,
    conn: Option<MultiplexedConnection>,
}

impl RedisListFeed {
    pub fn new(client: Client, key: impl Into<String>, poll_timeout: Duration) -> Self {
        Self {
            client,
            key: key.into(),
            poll_timeout,
            conn: None,
        }
    }
}

#[async_trait::async_trait]
impl EventFeed for RedisListFeed {
    async fn next_payload(&mut self) -> AppResult<Option<String>> {
        loop {
            if self.conn.is_none() {
                self.conn = Some(self.client.get_multiplexed_async_connection().await?);
                tracing::info!(key = %self.key, "Connected to ingestion feed");
            }
            let Some(conn) = self.conn.as_mut() else {
                continue;
            };

            let result: redis::RedisResult<Option<(String, String)>> =
                conn.brpop(&self.key, self.poll_timeout.as_secs_f64()).await;
            let popped = match result {
                Ok(popped) => popped,
                Err(e) => {
                    self.conn = None;
                    return Err(e.into());
                }
            };

            if let Some((_, payload)) = popped {
                return Ok(Some(payload));
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis-list"
    }
}

/// In-process feed over a tokio channel; closes when every sender is dropped
pub struct ChannelFeed {
    rx: mpsc::Receiver<String>,
}

impl ChannelFeed {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Creates a feed together with the sender that publishes into it
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait::async_trait]
impl EventFeed for ChannelFeed {
    async fn next_payload(&mut self) -> AppResult<Option<String>> {
        Ok(self.rx.recv().await)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
