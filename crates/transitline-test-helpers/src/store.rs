//! Recording location store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use transitline_errors::TransportError;
use transitline_geo::Position;
use transitline_transport::{LocationStore, wire};

/// A location store double that records every call.
///
/// Publishes and retractions are recorded in order. Fetches pop from
/// a scripted outcome queue when one is present; with no script the
/// store answers like a real one, serving the last published position
/// for the bus. Publish and retract failures can be switched on and
/// off mid-test.
#[derive(Debug, Default)]
pub struct RecordingStore {
    published: Mutex<Vec<(String, Position)>>,
    retracted: Mutex<Vec<String>>,
    current: Mutex<HashMap<String, Value>>,
    fetch_script: Mutex<VecDeque<Result<Option<Value>, TransportError>>>,
    fetch_calls: AtomicUsize,
    fail_publish: AtomicBool,
    fail_retract: AtomicBool,
}

impl RecordingStore {
    /// Create a store that accepts everything and records it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose publishes all fail as unreachable.
    #[must_use]
    pub fn with_publish_failure() -> Self {
        let store = Self::new();
        store.fail_publish.store(true, Ordering::Relaxed);
        store
    }

    /// Create a store whose retractions all fail as unreachable.
    #[must_use]
    pub fn with_retract_failure() -> Self {
        let store = Self::new();
        store.fail_retract.store(true, Ordering::Relaxed);
        store
    }

    /// Switch publish failure on or off.
    pub fn set_publish_failure(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::Relaxed);
    }

    /// Switch retract failure on or off.
    pub fn set_retract_failure(&self, fail: bool) {
        self.fail_retract.store(fail, Ordering::Relaxed);
    }

    /// Queue a scripted fetch outcome.
    pub fn push_fetch(&self, outcome: Result<Option<Value>, TransportError>) {
        self.fetch_script.lock().push_back(outcome);
    }

    /// All recorded publishes in order.
    #[must_use]
    pub fn publishes(&self) -> Vec<(String, Position)> {
        self.published.lock().clone()
    }

    /// Number of successful publishes.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    /// All recorded retractions in order.
    #[must_use]
    pub fn retractions(&self) -> Vec<String> {
        self.retracted.lock().clone()
    }

    /// Number of fetches answered so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    /// Last successfully published position, if any.
    #[must_use]
    pub fn last_published(&self) -> Option<(String, Position)> {
        self.published.lock().last().cloned()
    }
}

#[async_trait]
impl LocationStore for RecordingStore {
    async fn publish(&self, bus_id: &str, position: Position) -> Result<(), TransportError> {
        if self.fail_publish.load(Ordering::Relaxed) {
            return Err(TransportError::unreachable("scripted publish failure"));
        }
        self.published.lock().push((bus_id.to_owned(), position));
        self.current
            .lock()
            .insert(bus_id.to_owned(), wire::encode_position(&position));
        Ok(())
    }

    async fn fetch_current(&self, bus_id: &str) -> Result<Option<Value>, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        let scripted = self.fetch_script.lock().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(self.current.lock().get(bus_id).cloned()),
        }
    }

    async fn retract(&self, bus_id: &str) -> Result<(), TransportError> {
        if self.fail_retract.load(Ordering::Relaxed) {
            return Err(TransportError::unreachable("scripted retract failure"));
        }
        self.retracted.lock().push(bus_id.to_owned());
        self.current.lock().remove(bus_id);
        Ok(())
    }
}
