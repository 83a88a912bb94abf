use redis::AsyncCommands;
use redis::Client;

use crate::{db::EventStore, error::AppResult, models::ClickEvent};

/// Creates a Redis client for the event store and the ingestion feed
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Event store backed by a Redis list of JSON payloads
///
/// Writers `LPUSH`, so the list is newest first; reads reverse it back into
/// append order. Entries that fail to decode are logged and skipped.
#[derive(Clone)]
pub struct RedisEventStore {
    redis_client: Client,
    key: String,
}

impl RedisEventStore {
    pub fn new(redis_client: Client, key: impl Into<String>) -> Self {
        Self {
            redis_client,
            key: key.into(),
        }
    }
}

/// Decodes stored payloads (newest first) into events in append order
fn decode_entries(entries: Vec<String>) -> Vec<ClickEvent> {
    let mut events: Vec<ClickEvent> = entries
        .iter()
        .filter_map(|payload| match ClickEvent::from_payload(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::error!(error = %e, "Skipping undecodable stored event");
                None
            }
        })
        .collect();
    events.reverse();
    events
}

#[async_trait::async_trait]
impl EventStore for RedisEventStore {
    async fn append(&self, event: &ClickEvent) -> AppResult<()> {
        let payload = event.to_payload()?;
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.lpush(&self.key, payload).await?;
        Ok(())
    }

    async fn read_all(&self) -> AppResult<Vec<ClickEvent>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let entries: Vec<String> = conn.lrange(&self.key, 0, -1).await.map_err(|e| {
            tracing::warn!(error = %e, key = %self.key, "Redis read failed");
            e
        })?;

        let events = decode_entries(entries);
        tracing::info!(count = events.len(), key = %self.key, "Loaded events from Redis");
        Ok(events)
    }

    async fn len(&self) -> AppResult<usize> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let len: usize = conn.llen(&self.key).await?;
        Ok(len)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
