//! Test doubles and helpers for transitline.
//!
//! This crate provides scripted implementations of the two
//! collaborator traits the pipelines depend on, plus small unwrap
//! helpers for test code:
//!
//! - [`ScriptedSource`]: a position source that replays scripted
//!   one-shot outcomes and a scripted fix stream
//! - [`UnavailableSource`]: a source that always fails, for degraded
//!   mode tests
//! - [`RecordingStore`]: a location store that records publishes and
//!   retractions and can replay scripted fetch outcomes or fail on
//!   demand
//! - [`must`] / [`must_some`]: unwrap helpers with `#[track_caller]`

pub mod must;
pub mod source;
pub mod store;

pub use must::{must, must_some};
pub use source::{ScriptedSource, UnavailableSource};
pub use store::RecordingStore;
