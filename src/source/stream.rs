//! Stream-based source.
//!
//! Reads newline-delimited JSON transport events from an async byte stream,
//! typically a TCP connection to the controller bridge.

use std::sync::Arc;

use parking_lot::Mutex;
use robowatch_types::TransportEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::TelemetrySource;

/// A source that parses events from an async stream on a background task.
///
/// Lines that fail to parse are skipped and reported through
/// [`TelemetrySource::error`]; the stream keeps going.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use robowatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = br#"{"type":"log","data":{"level":"info","message":"hi"}}"#.to_vec();
/// let source = StreamSource::spawn(Cursor::new(data), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<TransportEvent>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a background task reading from `reader`.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(256);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!("Stream {} reached end of input", desc);
                        *error_handle.lock() = Some("Connection closed".to_string());
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<TransportEvent>(trimmed) {
                            Ok(event) => {
                                *error_handle.lock() = None;
                                if tx.send(event).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Skipping malformed event from {}: {}", desc, e);
                                *error_handle.lock() = Some(format!("Parse error: {}", e));
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Stream {} failed: {}", desc, e);
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }
}

impl TelemetrySource for StreamSource {
    fn poll(&mut self) -> Option<TransportEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let mut error = self.last_error.lock();
                if error.is_none() {
                    *error = Some("Stream disconnected".to_string());
                }
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robowatch_types::{DeviceId, ParamValue};
    use std::io::Cursor;

    fn telemetry_json() -> &'static str {
        r#"{"type":"telemetry","data":{"kind":"smart-device","timestamp_ms":1000,"samples":{"5":{"switch0":true}}}}"#
    }

    #[tokio::test]
    async fn test_stream_source_spawn() {
        let data = format!("{}\n", telemetry_json());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let event = source.poll();
        assert!(matches!(event, Some(TransportEvent::Telemetry(ref b)) if b.device_count() == 1));
    }

    #[tokio::test]
    async fn test_stream_source_skips_bad_lines() {
        let data = format!(
            "not valid json\n\n{}\n{}\n",
            telemetry_json(),
            r#"{"type":"log","data":{"timestamp_ms":5,"level":"critical","message":"brownout"}}"#
        );
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(matches!(source.poll(), Some(TransportEvent::Telemetry(_))));
        assert!(matches!(source.poll(), Some(TransportEvent::Log(_))));
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_reports_closed_connection() {
        let mut source = StreamSource::spawn(Cursor::new(""), "tcp://localhost:8101");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(source.poll().is_none());
        assert_eq!(source.error().as_deref(), Some("Connection closed"));
        assert_eq!(source.description(), "stream: tcp://localhost:8101");
    }

    #[tokio::test]
    async fn test_stream_source_keeps_batch_with_null_value() {
        let data = concat!(
            r#"{"type":"telemetry","data":{"kind":"smart-device","timestamp_ms":1000,"samples":{"5":{"switch0":true,"duty_cycle":null}}}}"#,
            "\n",
            r#"{"type":"log","data":{"level":"critical","event":"Student code raised","exc_info":null,"uids":["1","2"]}}"#,
            "\n",
        );
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let Some(TransportEvent::Telemetry(batch)) = source.poll() else {
            panic!("expected telemetry");
        };
        let params = &batch.samples[&DeviceId::new(5)];
        assert_eq!(params["switch0"], ParamValue::Bool(true));
        assert_eq!(params["duty_cycle"], ParamValue::Null);
        assert!(matches!(source.poll(), Some(TransportEvent::Log(ref e)) if e.level.is_fault()));
    }
}
