//! Shared observable session state.
//!
//! One [`SessionState`] aggregate lives for the whole session behind a
//! [`SessionStore`]. Every mutation goes through [`SessionStore::update`],
//! which notifies all subscribers once the closure returns, so observers
//! never see a half-applied change.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use robowatch_types::{LogEvent, TelemetryBatch};
use tokio::sync::watch;

use crate::config::HealthSettings;
use crate::data::Peripherals;
use crate::gate::RequestId;
use crate::health::ConnectionState;

/// Number of controller log events kept for display.
pub const LOG_HISTORY_CAPACITY: usize = 200;

/// Recent controller log events, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogHistory {
    events: VecDeque<LogEvent>,
}

impl LogHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LogEvent) {
        self.events.push_back(event);
        while self.events.len() > LOG_HISTORY_CAPACITY {
            self.events.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&LogEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// What the confirmation dialog observes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmationView {
    /// True while a request awaits a decision.
    pub pending: bool,
    /// The outstanding request, to hand back when resolving.
    pub request: Option<RequestId>,
}

/// The editor buffer as seen by the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    /// Local file backing the buffer, if any.
    pub path: Option<PathBuf>,
    pub content: String,
    /// True when the buffer has changes not yet persisted.
    pub dirty: bool,
}

impl EditorState {
    /// Reset to an empty, clean, unnamed buffer.
    pub fn clear(&mut self) {
        self.path = None;
        self.content.clear();
        self.dirty = false;
    }
}

/// The whole session aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub connection: ConnectionState,
    pub peripherals: Peripherals,
    pub confirmation: ConfirmationView,
    pub editor: EditorState,
    pub logs: LogHistory,
}

impl SessionState {
    pub fn new(health: &HealthSettings) -> Self {
        Self {
            connection: ConnectionState::new(health),
            ..Self::default()
        }
    }

    /// Merge a telemetry batch and forward its arrival to the estimator.
    ///
    /// Returns the timestamp the batch was recorded at.
    pub fn apply_batch(&mut self, batch: &TelemetryBatch) -> i64 {
        let timestamp_ms = batch.timestamp_or_now();
        let arrival = self.peripherals.apply_snapshot(
            batch.kind,
            timestamp_ms,
            &batch.samples,
            batch.disconnect,
        );
        if arrival {
            self.connection.record_arrival(timestamp_ms);
        }
        timestamp_ms
    }

    /// Record a controller log event.
    pub fn apply_log(&mut self, event: LogEvent) {
        self.connection.note_log(&event);
        self.logs.push(event);
    }
}

/// Cloneable handle to the session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}

impl SessionStore {
    pub fn new(state: SessionState) -> Self {
        let (tx, _) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Mutate the state and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_modify(f);
    }

    /// Borrow the current state.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Receive a notification on every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
