//! Telemetry batches and the transport event envelope.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::{DeviceId, LogEvent, ParamValue, PeripheralKind};

/// Parameter readings for one device, keyed by parameter name.
pub type ParamSamples = BTreeMap<String, ParamValue>;

/// Parameter readings for every device in a batch, keyed by device id.
pub type SampleMap = BTreeMap<DeviceId, ParamSamples>;

/// One timestamped snapshot of parameter readings for a peripheral class.
///
/// A batch is authoritative for its kind: a device of that kind that is
/// missing from the batch is no longer connected.
///
/// # Example
///
/// ```rust
/// use robowatch_types::{DeviceId, PeripheralKind, TelemetryBatch};
///
/// let batch = TelemetryBatch::builder(PeripheralKind::Gamepad)
///     .timestamp_ms(1_700_000_000_000)
///     .device(DeviceId::new(0), |d| d.param("joystick_left_x", 0.25).param("button_a", false))
///     .build();
///
/// assert_eq!(batch.device_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryBatch {
    /// Which peripheral class this batch describes.
    pub kind: PeripheralKind,

    /// Unix timestamp in milliseconds. Absent when the producer leaves
    /// stamping to the receiver.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub timestamp_ms: Option<i64>,

    /// Readings keyed by device id, then parameter name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub samples: SampleMap,

    /// Set when the transport reports that the controller link dropped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub disconnect: bool,
}

impl TelemetryBatch {
    /// Create an empty batch for a peripheral class.
    pub fn new(kind: PeripheralKind) -> Self {
        Self {
            kind,
            timestamp_ms: None,
            samples: BTreeMap::new(),
            disconnect: false,
        }
    }

    /// An explicit disconnect notice: empty, flagged, stamped.
    pub fn disconnect(kind: PeripheralKind, timestamp_ms: i64) -> Self {
        Self {
            kind,
            timestamp_ms: Some(timestamp_ms),
            samples: BTreeMap::new(),
            disconnect: true,
        }
    }

    /// Create a builder for constructing batches.
    pub fn builder(kind: PeripheralKind) -> TelemetryBatchBuilder {
        TelemetryBatchBuilder::new(kind)
    }

    /// Number of devices in the batch.
    pub fn device_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no devices are present.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The batch timestamp, falling back to the current wall clock.
    #[cfg(feature = "std")]
    pub fn timestamp_or_now(&self) -> i64 {
        self.timestamp_ms.unwrap_or_else(current_timestamp_ms)
    }
}

/// Builder for constructing [`TelemetryBatch`] instances.
#[derive(Debug)]
pub struct TelemetryBatchBuilder {
    batch: TelemetryBatch,
}

impl TelemetryBatchBuilder {
    /// Create a new builder.
    pub fn new(kind: PeripheralKind) -> Self {
        Self {
            batch: TelemetryBatch::new(kind),
        }
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: i64) -> Self {
        self.batch.timestamp_ms = Some(ts);
        self
    }

    /// Add a device with readings built using a closure.
    pub fn device<F>(mut self, id: impl Into<DeviceId>, f: F) -> Self
    where
        F: FnOnce(DeviceSamplesBuilder) -> DeviceSamplesBuilder,
    {
        let samples = f(DeviceSamplesBuilder::default()).params;
        self.batch.samples.insert(id.into(), samples);
        self
    }

    /// Mark the batch as a disconnect notice.
    pub fn disconnect(mut self) -> Self {
        self.batch.disconnect = true;
        self
    }

    /// Build the batch.
    pub fn build(self) -> TelemetryBatch {
        self.batch
    }
}

/// Builder for one device's parameter readings.
#[derive(Debug, Default)]
pub struct DeviceSamplesBuilder {
    params: ParamSamples,
}

impl DeviceSamplesBuilder {
    /// Record a parameter reading.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Everything the controller transport can deliver to the console.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "data", rename_all = "lowercase"))]
pub enum TransportEvent {
    /// A periodic peripheral snapshot.
    Telemetry(TelemetryBatch),
    /// A discrete log event.
    Log(LogEvent),
}

impl From<TelemetryBatch> for TransportEvent {
    fn from(batch: TelemetryBatch) -> Self {
        TransportEvent::Telemetry(batch)
    }
}

impl From<LogEvent> for TransportEvent {
    fn from(event: LogEvent) -> Self {
        TransportEvent::Log(event)
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
pub fn current_timestamp_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
