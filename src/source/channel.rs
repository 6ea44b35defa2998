//! Channel-based source for in-process producers.

use robowatch_types::TransportEvent;
use tokio::sync::mpsc;

use super::TelemetrySource;

/// Buffered events before producers wait.
const CHANNEL_CAPACITY: usize = 256;

/// A source fed through a tokio mpsc channel.
///
/// Every event sent is delivered exactly once, so each telemetry batch
/// counts as one arrival.
///
/// # Example
///
/// ```
/// use robowatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("runtime bridge");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<TransportEvent>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<TransportEvent>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a sender and the source it feeds.
    pub fn create(source_description: &str) -> (mpsc::Sender<TransportEvent>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl TelemetrySource for ChannelSource {
    fn poll(&mut self) -> Option<TransportEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.closed.then(|| "Producer closed".to_string())
    }
}
