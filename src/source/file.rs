//! File-based source replaying a recorded session.
//!
//! The file holds one JSON transport event per line. Events are released
//! at the pace they were recorded: an event stamped `t` becomes available
//! `t - t0` after the first poll, where `t0` is the first stamped event.
//! Released telemetry is re-stamped with the current clock so link health
//! behaves as it did live.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use robowatch_types::{current_timestamp_ms, TransportEvent};
use tracing::{debug, warn};

use super::TelemetrySource;

/// A source that replays newline-delimited JSON events from a file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    pending: Option<VecDeque<TransportEvent>>,
    origin_ms: Option<i64>,
    started: Option<Instant>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            pending: None,
            origin_ms: None,
            started: None,
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events not yet released.
    pub fn remaining(&self) -> usize {
        self.pending.as_ref().map_or(0, VecDeque::len)
    }

    fn load(&mut self) -> VecDeque<TransportEvent> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return VecDeque::new();
            }
        };

        let mut events = VecDeque::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TransportEvent>(line) {
                Ok(event) => events.push_back(event),
                Err(e) => {
                    warn!("{}:{}: skipping malformed event: {}", self.path.display(), number + 1, e);
                    self.last_error = Some(format!("Parse error on line {}: {}", number + 1, e));
                }
            }
        }

        self.origin_ms = events.iter().find_map(recorded_at);
        debug!("Loaded {} events from {}", events.len(), self.path.display());
        events
    }
}

fn recorded_at(event: &TransportEvent) -> Option<i64> {
    match event {
        TransportEvent::Telemetry(batch) => batch.timestamp_ms,
        TransportEvent::Log(log) => Some(log.timestamp_ms),
    }
}

impl TelemetrySource for FileSource {
    fn poll(&mut self) -> Option<TransportEvent> {
        if self.pending.is_none() {
            let events = self.load();
            self.pending = Some(events);
            self.started = Some(Instant::now());
        }

        let elapsed_ms = self.started.map_or(0, |s| s.elapsed().as_millis() as i64);
        let origin = self.origin_ms;
        let pending = self.pending.as_mut()?;

        let due = match (pending.front().and_then(recorded_at), origin) {
            (Some(at), Some(origin)) => at - origin <= elapsed_ms,
            _ => true,
        };
        if !due {
            return None;
        }

        match pending.pop_front()? {
            TransportEvent::Telemetry(mut batch) => {
                batch.timestamp_ms = Some(current_timestamp_ms());
                Some(TransportEvent::Telemetry(batch))
            }
            event => Some(event),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/session.ndjson");
        assert_eq!(source.path(), Path::new("/tmp/session.ndjson"));
        assert_eq!(source.description(), "file: /tmp/session.ndjson");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_replays_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"type":"telemetry","data":{{"kind":"smart-device","timestamp_ms":1000,"samples":{{"5":{{"switch0":true}}}}}}}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"type":"log","data":{{"timestamp_ms":1000,"level":"info","message":"ready"}}}}"#).unwrap();
        writeln!(file, r#"{{"type":"log","data":{{"timestamp_ms":60000,"level":"info","message":"later"}}}}"#).unwrap();

        let before = current_timestamp_ms();
        let mut source = FileSource::new(file.path());

        let Some(TransportEvent::Telemetry(batch)) = source.poll() else {
            panic!("expected telemetry first");
        };
        assert!(batch.timestamp_ms.unwrap() >= before);
        assert!(matches!(source.poll(), Some(TransportEvent::Log(_))));

        // The last event was recorded a minute later
        assert!(source.poll().is_none());
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/session.ndjson");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error on line 1"));
    }
}
