//! Scripted position sources.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use transitline_errors::SourceError;
use transitline_source::{Fix, FixReceiver, PositionSource};

#[derive(Debug, Clone)]
struct StreamScript {
    fixes: Vec<Fix>,
    gap: Duration,
    hold_open: bool,
}

/// A position source that replays scripted outcomes.
///
/// One-shot requests pop from a queue of scripted results; once the
/// queue is empty they time out. The fix stream replays a scripted
/// sequence and then either closes, which a consuming pipeline sees
/// as the source going away, or stays open silently.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    once_outcomes: Mutex<VecDeque<Result<Fix, SourceError>>>,
    stream_script: Mutex<Option<StreamScript>>,
    once_calls: AtomicUsize,
    stream_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Create a source with nothing scripted. One-shot requests time
    /// out and streams close immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot outcome.
    pub fn push_once(&self, outcome: Result<Fix, SourceError>) {
        self.once_outcomes.lock().push_back(outcome);
    }

    /// Queue successful one-shot fixes.
    #[must_use]
    pub fn with_once_fixes(self, fixes: impl IntoIterator<Item = Fix>) -> Self {
        self.once_outcomes.lock().extend(fixes.into_iter().map(Ok));
        self
    }

    /// Script the fix stream to send `fixes` and then close.
    #[must_use]
    pub fn with_stream(self, fixes: Vec<Fix>) -> Self {
        *self.stream_script.lock() = Some(StreamScript {
            fixes,
            gap: Duration::ZERO,
            hold_open: false,
        });
        self
    }

    /// Script the fix stream to send `fixes` and then stay open
    /// without producing anything further.
    #[must_use]
    pub fn with_stream_held_open(self, fixes: Vec<Fix>) -> Self {
        *self.stream_script.lock() = Some(StreamScript {
            fixes,
            gap: Duration::ZERO,
            hold_open: true,
        });
        self
    }

    /// Insert a delay before each streamed fix.
    #[must_use]
    pub fn with_stream_gap(self, gap: Duration) -> Self {
        let mut script = self.stream_script.lock();
        if let Some(s) = script.as_mut() {
            s.gap = gap;
        }
        drop(script);
        self
    }

    /// Number of one-shot requests made so far.
    #[must_use]
    pub fn once_calls(&self) -> usize {
        self.once_calls.load(Ordering::Relaxed)
    }

    /// Number of streams opened so far.
    #[must_use]
    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    fn source_id(&self) -> &str {
        "scripted"
    }

    async fn request_once(&self, wait: Duration) -> Result<Fix, SourceError> {
        self.once_calls.fetch_add(1, Ordering::Relaxed);
        let next = self.once_outcomes.lock().pop_front();
        next.unwrap_or_else(|| Err(SourceError::timeout(wait)))
    }

    async fn stream_fixes(&self) -> Result<FixReceiver, SourceError> {
        self.stream_calls.fetch_add(1, Ordering::Relaxed);
        let script = self.stream_script.lock().clone().unwrap_or_else(|| StreamScript {
            fixes: Vec::new(),
            gap: Duration::ZERO,
            hold_open: false,
        });

        let (tx, rx) = mpsc::channel(script.fixes.len().max(1));
        tokio::spawn(async move {
            for fix in script.fixes {
                if !script.gap.is_zero() {
                    tokio::time::sleep(script.gap).await;
                }
                if tx.send(fix).await.is_err() {
                    return;
                }
            }
            if script.hold_open {
                // Keep the sender alive so the stream never closes.
                std::future::pending::<()>().await;
            }
        });

        Ok(rx)
    }
}

/// A position source that always fails.
#[derive(Debug)]
pub struct UnavailableSource {
    error: SourceError,
    calls: AtomicUsize,
}

impl UnavailableSource {
    /// Fail every request with an unavailability error.
    #[must_use]
    pub fn new() -> Self {
        Self {
            error: SourceError::unavailable("no positioning capability"),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every request with a permission error.
    #[must_use]
    pub fn permission_denied() -> Self {
        Self {
            error: SourceError::permission_denied("position access refused"),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests refused so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for UnavailableSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionSource for UnavailableSource {
    fn source_id(&self) -> &str {
        "unavailable"
    }

    async fn request_once(&self, _wait: Duration) -> Result<Fix, SourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(self.error.clone())
    }

    async fn stream_fixes(&self) -> Result<FixReceiver, SourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(self.error.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use transitline_geo::Position;

    fn fix(lat: f64) -> Fix {
        Fix::new(Position::new(lat, 77.0), 5.0)
    }

    #[tokio::test]
    async fn test_scripted_once_outcomes_in_order() {
        let source = ScriptedSource::new().with_once_fixes([fix(1.0), fix(2.0)]);

        let a = source.request_once(Duration::from_secs(1)).await;
        let b = source.request_once(Duration::from_secs(1)).await;
        assert!((a.unwrap().position.latitude - 1.0).abs() < 1e-9);
        assert!((b.unwrap().position.latitude - 2.0).abs() < 1e-9);
        assert_eq!(source.once_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_once_exhausted_times_out() {
        let source = ScriptedSource::new();
        let result = source.request_once(Duration::from_secs(3)).await;
        assert!(matches!(result, Err(SourceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_scripted_stream_replays_then_closes() {
        let source = ScriptedSource::new().with_stream(vec![fix(1.0), fix(2.0)]);
        let mut rx = source.stream_fixes().await.unwrap();

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scripted_stream_can_stay_open() {
        let source = ScriptedSource::new().with_stream_held_open(vec![fix(1.0)]);
        let mut rx = source.stream_fixes().await.unwrap();

        assert!(rx.recv().await.is_some());
        let pending = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await;
        assert!(pending.is_err(), "stream should stay open and silent");
    }

    #[tokio::test]
    async fn test_unavailable_source_refuses_everything() {
        let source = UnavailableSource::new();
        assert!(source.request_once(Duration::from_secs(1)).await.is_err());
        assert!(source.stream_fixes().await.is_err());
        assert_eq!(source.calls(), 2);
    }
}
