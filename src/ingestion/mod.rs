//! Background ingestion: drains an external feed of raw click payloads into the
//! event store. Query handling never waits on, or requires, this worker.

pub mod feed;
pub mod worker;

pub use feed::{ChannelFeed, EventFeed, RedisListFeed};
pub use worker::{IngestionHandle, IngestionStats, IngestionWorker, RestartPolicy};
