//! In-process location store.
//!
//! A last-write-wins map from bus identifier to the encoded wire
//! payload, shared behind an `RwLock`. Stands in for the remote store
//! in tests, demos, and single-host deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use transitline_errors::TransportError;
use transitline_geo::Position;

use crate::{LocationStore, wire};

/// In-memory last-write-wins location store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buses with a currently published position.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no bus has a published position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn publish(&self, bus_id: &str, position: Position) -> Result<(), TransportError> {
        let payload = wire::encode_position(&position);
        self.entries.write().insert(bus_id.to_owned(), payload);
        debug!(bus_id, lat = position.latitude, lng = position.longitude, "published position");
        Ok(())
    }

    async fn fetch_current(&self, bus_id: &str) -> Result<Option<Value>, TransportError> {
        Ok(self.entries.read().get(bus_id).cloned())
    }

    async fn retract(&self, bus_id: &str) -> Result<(), TransportError> {
        let removed = self.entries.write().remove(bus_id).is_some();
        debug!(bus_id, removed, "retracted position");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wire::decode_position;

    #[tokio::test]
    async fn test_publish_then_fetch() {
        let store = MemoryStore::new();
        let position = Position::new(28.6139, 77.2090);
        store.publish("bus-7", position).await.unwrap();

        let payload = store.fetch_current("bus-7").await.unwrap().unwrap();
        assert_eq!(decode_position(&payload).unwrap(), position);
    }

    #[tokio::test]
    async fn test_fetch_unknown_bus_is_none() {
        let store = MemoryStore::new();
        assert!(store.fetch_current("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_is_last_write_wins() {
        let store = MemoryStore::new();
        store.publish("bus-7", Position::new(1.0, 1.0)).await.unwrap();
        store.publish("bus-7", Position::new(2.0, 2.0)).await.unwrap();

        let payload = store.fetch_current("bus-7").await.unwrap().unwrap();
        assert_eq!(decode_position(&payload).unwrap(), Position::new(2.0, 2.0));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_retract_removes_entry() {
        let store = MemoryStore::new();
        store.publish("bus-7", Position::new(1.0, 1.0)).await.unwrap();
        store.retract("bus-7").await.unwrap();
        assert!(store.fetch_current("bus-7").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_retract_absent_entry_succeeds() {
        let store = MemoryStore::new();
        assert!(store.retract("never-published").await.is_ok());
    }

    #[tokio::test]
    async fn test_buses_are_independent() {
        let store = MemoryStore::new();
        store.publish("bus-1", Position::new(1.0, 1.0)).await.unwrap();
        store.publish("bus-2", Position::new(2.0, 2.0)).await.unwrap();
        store.retract("bus-1").await.unwrap();

        assert!(store.fetch_current("bus-1").await.unwrap().is_none());
        assert!(store.fetch_current("bus-2").await.unwrap().is_some());
    }
}
