//! Session driver: feeds transport events into the store and ticks health.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use robowatch_types::{current_timestamp_ms, PeripheralKind, TransportEvent};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::duration::format_duration;
use crate::gate::ConfirmationGate;
use crate::source::TelemetrySource;
use crate::store::{SessionState, SessionStore};

/// Upper bound on events applied by one [`Session::pump`].
const MAX_EVENTS_PER_PUMP: usize = 1024;

/// Shortest tick period the run loop accepts.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the session state for the lifetime of the console.
pub struct Session {
    store: SessionStore,
    gate: ConfirmationGate,
    source: Box<dyn TelemetrySource>,
    settings: Settings,
    last_source_error: Option<String>,
}

impl Session {
    pub fn new(source: Box<dyn TelemetrySource>, settings: Settings) -> Self {
        let store = SessionStore::new(SessionState::new(&settings.health));
        let gate = ConfirmationGate::new(store.clone(), &settings.gate);
        Self {
            store,
            gate,
            source,
            settings,
            last_source_error: None,
        }
    }

    /// Handle to the shared state.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Handle to the confirmation gate guarding editor operations.
    pub fn gate(&self) -> ConfirmationGate {
        self.gate.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a description of the current source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Apply every event the source has ready.
    ///
    /// Returns the number of events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while applied < MAX_EVENTS_PER_PUMP {
            let Some(event) = self.source.poll() else {
                break;
            };
            self.apply(event);
            applied += 1;
        }

        let error = self.source.error();
        if error != self.last_source_error {
            match &error {
                Some(e) => warn!("Source {}: {}", self.source.description(), e),
                None => info!("Source {} recovered", self.source.description()),
            }
            self.last_source_error = error;
        }
        applied
    }

    /// Apply one transport event.
    pub fn apply(&self, event: TransportEvent) {
        match event {
            TransportEvent::Telemetry(batch) => {
                let mut ts = 0;
                self.store.update(|s| ts = s.apply_batch(&batch));
                debug!(
                    "Applied {:?} batch of {} devices at {}",
                    batch.kind,
                    batch.device_count(),
                    ts
                );
            }
            TransportEvent::Log(event) => self.store.update(|s| s.apply_log(event)),
        }
    }

    /// Advance the health estimator to the current time.
    pub fn tick(&self) {
        self.tick_at(current_timestamp_ms());
    }

    /// Advance the health estimator to `now_ms`.
    pub fn tick_at(&self, now_ms: i64) {
        self.store.update(|s| s.connection.tick(now_ms));
    }

    /// Pump and tick on the configured interval until `shutdown` completes.
    ///
    /// Any confirmation still pending on return is dismissed.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.settings.health.tick_interval.max(MIN_TICK_INTERVAL);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Session started on {} (tick every {})",
            self.source.description(),
            format_duration(period)
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.pump();
                    self.tick();
                }
            }
        }

        if self.gate.dismiss() {
            debug!("Dismissed pending confirmation on shutdown");
        }
        info!("Session stopped");
    }

    /// Export the current state to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        let state = self.store.snapshot();
        let mut export = serde_json::Map::new();

        let view = state.connection.view();
        export.insert(
            "connection".to_string(),
            serde_json::json!({
                "status": format!("{:?}", view.status),
                "mode": view.mode,
                "alliance": view.alliance,
                "relative_rate": view.relative_rate,
                "error": state.connection.error_flag,
            }),
        );

        let gamepads = state.peripherals.of_kind(PeripheralKind::Gamepad).count();
        let devices = state.peripherals.of_kind(PeripheralKind::SmartDevice).count();
        export.insert(
            "summary".to_string(),
            serde_json::json!({
                "total_peripherals": state.peripherals.len(),
                "gamepads": gamepads,
                "smart_devices": devices,
                "log_events": state.logs.len(),
            }),
        );

        let peripherals: Vec<serde_json::Value> = state
            .peripherals
            .sorted()
            .map(|p| {
                let latest: serde_json::Map<String, serde_json::Value> = p
                    .params
                    .iter()
                    .filter_map(|(name, timeline)| {
                        let sample = timeline.latest()?;
                        Some((name.clone(), serde_json::to_value(&sample.value).ok()?))
                    })
                    .collect();
                serde_json::json!({
                    "kind": p.kind(),
                    "id": p.id.device,
                    "type": p.device_type().name(),
                    "params": latest,
                })
            })
            .collect();
        export.insert("peripherals".to_string(), serde_json::Value::Array(peripherals));

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        info!("Exported session state to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ConnectionStatus;
    use crate::source::ChannelSource;
    use robowatch_types::{LogEvent, LogLevel, TelemetryBatch};

    fn session() -> (tokio::sync::mpsc::Sender<TransportEvent>, Session) {
        let (tx, source) = ChannelSource::create("test");
        (tx, Session::new(Box::new(source), Settings::default()))
    }

    #[test]
    fn test_pump_applies_events() {
        let (tx, mut session) = session();
        tx.try_send(
            TelemetryBatch::builder(PeripheralKind::SmartDevice)
                .timestamp_ms(1000)
                .device(5u64, |d| d.param("switch0", true))
                .build()
                .into(),
        )
        .unwrap();
        assert_eq!(session.pump(), 1);
        session.tick_at(1050);

        tx.try_send(LogEvent::new(1001, LogLevel::Critical, "brownout").into())
            .unwrap();
        assert_eq!(session.pump(), 1);
        assert_eq!(session.pump(), 0);

        let state = session.store().snapshot();
        assert_eq!(state.peripherals.len(), 1);
        assert_eq!(state.connection.recent_arrivals.len(), 1);
        assert!(state.connection.error_flag);
        assert_eq!(state.logs.len(), 1);
    }

    #[test]
    fn test_tick_at_uses_given_clock() {
        let (tx, mut session) = session();
        for i in 0..20 {
            tx.try_send(
                TelemetryBatch::builder(PeripheralKind::SmartDevice)
                    .timestamp_ms(i * 100)
                    .device(1u64, |d| d.param("enc", i))
                    .build()
                    .into(),
            )
            .unwrap();
        }
        session.pump();

        session.tick_at(1950);
        assert_ne!(session.store().read(|s| s.connection.status), ConnectionStatus::Disconnected);

        session.tick_at(1900 + 8000);
        assert_eq!(session.store().read(|s| s.connection.status), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_and_dismisses_gate() {
        let (_tx, mut session) = session();
        let gate = session.gate();
        let waiter = tokio::spawn(async move { gate.request_confirmation().await });
        let mut rx = session.store().subscribe();
        while !rx.borrow_and_update().confirmation.pending {
            rx.changed().await.unwrap();
        }

        session.run(tokio::time::sleep(std::time::Duration::from_secs(1))).await;

        assert!(waiter.await.unwrap().unwrap_err().is_user_abort());
        assert!(!session.store().read(|s| s.confirmation.pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_zero_tick_interval_uses_floor() {
        let (_tx, source) = ChannelSource::create("test");
        let mut settings = Settings::default();
        settings.health.tick_interval = Duration::ZERO;
        let mut session = Session::new(Box::new(source), settings);

        session.run(tokio::time::sleep(Duration::from_millis(20))).await;

        assert_eq!(session.store().read(|s| s.connection.status), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_export_state() {
        let (tx, mut session) = session();
        tx.try_send(
            TelemetryBatch::builder(PeripheralKind::SmartDevice)
                .timestamp_ms(1000)
                .device(5u64, |d| d.param("switch0", true).param("duty_cycle", 0.25))
                .build()
                .into(),
        )
        .unwrap();
        session.pump();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        session.export_state(&path).unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported["summary"]["smart_devices"], 1);
        assert_eq!(exported["peripherals"][0]["id"], "5");
        assert_eq!(exported["peripherals"][0]["params"]["switch0"], true);
        assert_eq!(exported["connection"]["mode"], "idle");
    }
}
