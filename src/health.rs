//! Connection health estimation.
//!
//! Turns telemetry arrival timestamps plus a periodic tick into a smoothed
//! arrival rate and a discrete link status. Each tick halves the running
//! estimate and mixes in the rate observed across the retained arrival
//! window, which damps bursts while still reaching `Disconnected` once the
//! controller goes quiet for the disconnect timeout.

use std::collections::VecDeque;
use std::time::Duration;

use robowatch_types::{Alliance, LogEvent, Mode};
use tracing::{debug, info, warn};

use crate::config::HealthSettings;

/// Weight kept from the previous estimate on each tick.
pub const DECAY: f64 = 0.5;

/// Maximum number of arrival timestamps retained.
pub const ARRIVAL_CAPACITY: usize = 50;

/// Relative rate above which the link counts as healthy.
pub const HEALTHY_RATIO: f64 = 0.9;

/// Discrete status of the controller link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Healthy,
    Unhealthy,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            ConnectionStatus::Healthy => "OK",
            ConnectionStatus::Unhealthy => "SLOW",
            ConnectionStatus::Disconnected => "DOWN",
        }
    }
}

/// The projection shown by the status display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub status: ConnectionStatus,
    pub mode: Mode,
    pub alliance: Option<Alliance>,
    pub relative_rate: f64,
}

/// Link state for the lifetime of the console session.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub mode: Mode,
    pub alliance: Option<Alliance>,
    /// Arrival timestamps in milliseconds, oldest first.
    pub recent_arrivals: VecDeque<i64>,
    /// Smoothed arrivals per second.
    pub smoothed_rate: f64,
    /// `smoothed_rate` relative to the expected rate, within `[0, 1]`.
    pub relative_rate: f64,
    /// Sticky controller fault indicator.
    pub error_flag: bool,
    /// Interval at which telemetry is expected to arrive.
    pub expected_interval: Duration,
    /// Silence after which the link counts as disconnected.
    pub disconnect_timeout: Duration,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new(&HealthSettings::default())
    }
}

impl ConnectionState {
    /// A fresh, disconnected link.
    pub fn new(settings: &HealthSettings) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            mode: Mode::Idle,
            alliance: None,
            recent_arrivals: VecDeque::with_capacity(ARRIVAL_CAPACITY + 1),
            smoothed_rate: 0.0,
            relative_rate: 0.0,
            error_flag: false,
            expected_interval: settings.expected_interval,
            disconnect_timeout: settings.disconnect_timeout,
        }
    }

    /// Record one accepted telemetry batch.
    pub fn record_arrival(&mut self, timestamp_ms: i64) {
        self.recent_arrivals.push_back(timestamp_ms);
        self.trim_arrivals();
    }

    /// Advance the estimator to `now_ms`.
    pub fn tick(&mut self, now_ms: i64) {
        let timeout = self.disconnect_timeout.as_secs_f64();
        self.smoothed_rate *= DECAY;

        let elapsed = match (self.recent_arrivals.front(), self.recent_arrivals.back()) {
            (Some(&first), Some(&last)) => {
                let window = (now_ms - first) as f64 / 1000.0;
                if window > 0.0 {
                    let count = self.recent_arrivals.len() as f64;
                    self.smoothed_rate += (1.0 - DECAY) * count / window;
                }
                (now_ms - last) as f64 / 1000.0
            }
            _ => timeout,
        };

        self.trim_arrivals();

        let expected_rate = 1.0 / self.expected_interval.as_secs_f64().max(f64::EPSILON);
        let relative = self.smoothed_rate / expected_rate;
        self.relative_rate = if relative.is_finite() {
            relative.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let status = if elapsed >= timeout {
            self.mode = Mode::Idle;
            self.error_flag = false;
            ConnectionStatus::Disconnected
        } else if self.relative_rate > HEALTHY_RATIO {
            ConnectionStatus::Healthy
        } else {
            ConnectionStatus::Unhealthy
        };

        if status != self.status {
            info!(
                "Link status {} -> {} (relative rate {:.2})",
                self.status.symbol(),
                status.symbol(),
                self.relative_rate
            );
        }
        self.status = status;
    }

    /// Note a controller log event; faults raise the error flag.
    ///
    /// A disconnected link always reads as a clean idle controller, so faults
    /// reported while disconnected are not flagged.
    pub fn note_log(&mut self, event: &LogEvent) {
        if event.level.is_fault() {
            if self.status == ConnectionStatus::Disconnected {
                debug!("Ignoring fault while disconnected: {}", event.message);
                return;
            }
            if !self.error_flag {
                warn!("Controller fault reported: {}", event.message);
            }
            self.error_flag = true;
        }
    }

    /// Apply the outcome of a successful mode change.
    ///
    /// An emergency stop leaves the controller idle with the fault flag set;
    /// returning to idle clears the flag. While disconnected the state stays
    /// idle and unfaulted whatever was requested.
    pub fn apply_mode(&mut self, requested: Mode) {
        if self.status == ConnectionStatus::Disconnected {
            debug!("Link down, keeping idle instead of {}", requested.label());
            self.mode = Mode::Idle;
            self.error_flag = false;
            return;
        }
        match requested {
            Mode::EStop => {
                self.mode = Mode::Idle;
                self.error_flag = true;
            }
            Mode::Idle => {
                self.mode = Mode::Idle;
                self.error_flag = false;
            }
            Mode::Auto | Mode::Teleop => self.mode = requested,
        }
    }

    /// The projection shown by the status display.
    pub fn view(&self) -> StatusView {
        StatusView {
            status: self.status,
            mode: self.mode,
            alliance: self.alliance,
            relative_rate: self.relative_rate,
        }
    }

    fn trim_arrivals(&mut self) {
        while self.recent_arrivals.len() > ARRIVAL_CAPACITY {
            self.recent_arrivals.pop_front();
        }
    }
}
