use std::sync::Arc;

use crate::{config::QueryDefaults, db::EventStore};

/// Shared application state
///
/// Holds only the event store handle and request defaults; no mined rules or
/// query results are kept between requests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub defaults: QueryDefaults,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, defaults: QueryDefaults) -> Self {
        Self { store, defaults }
    }

    /// State with the built-in query defaults
    pub fn with_store(store: Arc<dyn EventStore>) -> Self {
        Self::new(store, QueryDefaults::default())
    }
}
