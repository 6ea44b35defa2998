//! Log events forwarded from the controller.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::ParamValue;

/// Log severity levels, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[cfg_attr(feature = "serde", serde(alias = "warning"))]
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    /// Returns true if this level reports a controller fault.
    pub fn is_fault(&self) -> bool {
        *self >= LogLevel::Error
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WRN",
            LogLevel::Error => "ERR",
            LogLevel::Critical => "CRT",
        }
    }
}

/// A structured log event emitted by the controller runtime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEvent {
    /// Unix timestamp in milliseconds when the event was logged.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp_ms: i64,

    /// Severity of the event.
    #[cfg_attr(feature = "serde", serde(default))]
    pub level: LogLevel,

    /// The event message.
    #[cfg_attr(feature = "serde", serde(alias = "event"))]
    pub message: String,

    /// Any additional key-value context bound to the event.
    #[cfg_attr(feature = "serde", serde(default, flatten))]
    pub context: BTreeMap<String, ParamValue>,
}

impl LogEvent {
    /// Create an event without context.
    pub fn new(timestamp_ms: i64, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            level,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a context field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_levels() {
        assert!(!LogLevel::Warn.is_fault());
        assert!(LogLevel::Error.is_fault());
        assert!(LogLevel::Critical.is_fault());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_runtime_event() {
        let json = r#"{
            "timestamp_ms": 1200,
            "level": "critical",
            "event": "Student code raised",
            "exc_type": "ZeroDivisionError",
            "line": 14
        }"#;

        let event: LogEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.level, LogLevel::Critical);
        assert_eq!(event.message, "Student code raised");
        assert_eq!(
            event.context.get("exc_type"),
            Some(&ParamValue::Text("ZeroDivisionError".into()))
        );
        assert_eq!(event.context.get("line"), Some(&ParamValue::Int(14)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_event_with_null_and_list_context() {
        let json = r#"{"level":"critical","event":"Student code raised","exc_info":null,"uids":["1","2"]}"#;

        let event: LogEvent = serde_json::from_str(json).unwrap();
        assert!(event.level.is_fault());
        assert_eq!(event.context.get("exc_info"), Some(&ParamValue::Null));
        assert_eq!(
            event.context.get("uids"),
            Some(&ParamValue::List(alloc::vec![
                ParamValue::from("1"),
                ParamValue::from("2")
            ]))
        );
    }
}
