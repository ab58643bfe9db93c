//! Location store transport.
//!
//! Defines the trait the pipelines use to publish and fetch bus
//! positions, the flat wire codec for position payloads, and an
//! in-process store for tests, demos, and single-host deployments.
//!
//! Fetches return the raw payload rather than a decoded position so
//! that callers can distinguish a malformed answer from a transport
//! failure and surface it as invalid data instead of dropping it.

use async_trait::async_trait;
use serde_json::Value;

use transitline_errors::TransportError;
use transitline_geo::Position;

pub mod memory;
pub mod wire;

pub use memory::MemoryStore;
pub use wire::{decode_position, encode_position};

/// Location store trait for publish/fetch/retract of bus positions.
///
/// Stores are last-write-wins per bus identifier and hold at most one
/// current position per bus.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Publish `position` as the current position of `bus_id`,
    /// replacing any previous one.
    async fn publish(&self, bus_id: &str, position: Position) -> Result<(), TransportError>;

    /// Fetch the current raw payload for `bus_id`.
    ///
    /// `Ok(None)` means no position is currently published, which is
    /// a valid answer and not an error.
    async fn fetch_current(&self, bus_id: &str) -> Result<Option<Value>, TransportError>;

    /// Remove the current position of `bus_id`, if any. Retracting an
    /// absent entry succeeds.
    async fn retract(&self, bus_id: &str) -> Result<(), TransportError>;
}
