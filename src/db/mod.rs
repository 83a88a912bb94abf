use crate::{error::AppResult, models::ClickEvent};

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryEventStore;
pub use redis_store::{create_redis_client, RedisEventStore};

/// Append-only log of raw click events
///
/// The ingestion worker is the only writer; queries take a snapshot with
/// [`EventStore::read_all`]. A snapshot may or may not include an event appended
/// concurrently with the read: consistency is eventual, not linearizable.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event to the end of the log
    async fn append(&self, event: &ClickEvent) -> AppResult<()>;

    /// Returns every stored event in append order
    async fn read_all(&self) -> AppResult<Vec<ClickEvent>>;

    /// Number of stored events
    async fn len(&self) -> AppResult<usize>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
