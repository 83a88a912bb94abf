use tokio::sync::RwLock;

use crate::{db::EventStore, error::AppResult, models::ClickEvent};

/// Process-local event store, used in tests and when running without Redis
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<ClickEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<ClickEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &ClickEvent) -> AppResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn read_all(&self) -> AppResult<Vec<ClickEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.events.read().await.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_append_then_read_keeps_order() {
        let store = InMemoryEventStore::new();
        assert_ok!(store.append(&ClickEvent::new("A", "c", 1.0, None)).await);
        assert_ok!(store.append(&ClickEvent::new("B", "c", 2.0, None)).await);

        let events = store.read_all().await.unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.product_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_appends() {
        let store = InMemoryEventStore::with_events(vec![ClickEvent::new("A", "c", 1.0, None)]);
        let snapshot = store.read_all().await.unwrap();
        store.append(&ClickEvent::new("B", "c", 1.0, None)).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
