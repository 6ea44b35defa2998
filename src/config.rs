//! Console settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `ROBOWATCH_*` environment variables (nested keys joined with `__`).
//!
//! ```toml
//! [health]
//! tick_interval = "200ms"
//! expected_interval = "100ms"
//! disconnect_timeout = "8s"
//!
//! [gate]
//! timeout = "60s"
//!
//! [editor]
//! strip_trailing_whitespace = true
//! ensure_trailing_newline = true
//!
//! [control]
//! open_log_on_run = true
//!
//! [remote]
//! host = "192.168.0.1"
//! user = "pi"
//! code_path = "runtime/studentcode.py"
//! ```
//!
//! For example, `ROBOWATCH_GATE__TIMEOUT=30s` shortens the confirmation
//! timeout without touching the file.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration;
use crate::error::{ConsoleError, Result};

/// Link health estimation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Period of the estimator tick.
    #[serde(deserialize_with = "duration::deserialize")]
    pub tick_interval: Duration,
    /// Interval at which the controller is expected to publish telemetry.
    #[serde(deserialize_with = "duration::deserialize")]
    pub expected_interval: Duration,
    /// Silence after which the link counts as disconnected.
    #[serde(deserialize_with = "duration::deserialize")]
    pub disconnect_timeout: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            expected_interval: Duration::from_millis(100),
            disconnect_timeout: Duration::from_secs(8),
        }
    }
}

/// Confirmation gate parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    #[serde(deserialize_with = "duration::deserialize")]
    pub timeout: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Save-time normalization of the editor buffer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub strip_trailing_whitespace: bool,
    pub ensure_trailing_newline: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            strip_trailing_whitespace: false,
            ensure_trailing_newline: true,
        }
    }
}

/// Run-mode control policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Open the log display when a program starts running.
    pub open_log_on_run: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            open_log_on_run: true,
        }
    }
}

/// Where student code lives on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub code_path: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            host: "192.168.0.1".to_string(),
            port: 22,
            user: "pi".to_string(),
            code_path: "runtime/studentcode.py".to_string(),
        }
    }
}

/// All console settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub health: HealthSettings,
    pub gate: GateSettings,
    pub editor: EditorSettings,
    pub control: ControlSettings,
    pub remote: RemoteSettings,
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("ROBOWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject intervals the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("health.tick_interval", self.health.tick_interval),
            ("health.expected_interval", self.health.expected_interval),
            ("gate.timeout", self.gate.timeout),
        ];
        for (key, value) in intervals {
            if value.is_zero() {
                return Err(ConsoleError::Config(format!("{} must be greater than zero", key)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.health.tick_interval, Duration::from_millis(200));
        assert_eq!(settings.health.disconnect_timeout, Duration::from_secs(8));
        assert_eq!(settings.gate.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[health]
expected_interval = "50ms"

[editor]
strip_trailing_whitespace = true
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.health.expected_interval, Duration::from_millis(50));
        assert_eq!(settings.health.tick_interval, Duration::from_millis(200));
        assert!(settings.editor.strip_trailing_whitespace);
        assert!(settings.editor.ensure_trailing_newline);
        assert_eq!(settings.remote.port, 22);
    }

    #[test]
    fn test_load_rejects_bad_duration() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[gate]\ntimeout = \"soon\"").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, crate::error::ConsoleError::Config(_)));
    }

    #[test]
    fn test_load_rejects_zero_tick_interval() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[health]\ntick_interval = \"0ms\"").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(
            matches!(err, ConsoleError::Config(ref msg) if msg.contains("health.tick_interval"))
        );
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.health.expected_interval = Duration::ZERO;
        assert!(matches!(settings.validate(), Err(ConsoleError::Config(_))));

        settings.health.expected_interval = Duration::from_millis(100);
        settings.gate.timeout = Duration::ZERO;
        let err = settings.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: gate.timeout must be greater than zero");
    }
}
