//! Transport sources delivering controller telemetry and log events.
//!
//! Every source yields [`TransportEvent`]s through the non-blocking
//! [`TelemetrySource::poll`], whether the events come from an in-process
//! producer, a network stream, or a recorded session file.

mod channel;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use robowatch_types::TransportEvent;

/// Trait for receiving transport events from various sources.
///
/// # Example
///
/// ```
/// use robowatch::{ChannelSource, TelemetrySource};
///
/// let (_tx, mut source) = ChannelSource::create("in-process");
/// assert!(source.poll().is_none());
/// ```
pub trait TelemetrySource: Send + Debug {
    /// Take the next available event.
    ///
    /// Returns `None` when nothing is ready. Must not block.
    fn poll(&mut self) -> Option<TransportEvent>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The most recent error, if the source is failing.
    fn error(&self) -> Option<String>;
}
