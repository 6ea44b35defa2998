//! Peripheral telemetry models and processing.
//!
//! This module turns raw telemetry batches into per-device parameter
//! histories suitable for display.
//!
//! ## Submodules
//!
//! - [`catalog`]: Device type codes to display labels, with an unknown fallback
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "8s", "200ms")
//! - [`peripheral`]: The identity-keyed store ([`Peripherals`]) with eviction
//! - [`timeline`]: Bounded per-parameter history ([`BoundedTimeline`])
//!
//! ## Data Flow
//!
//! ```text
//! TelemetryBatch (transport)
//!        │
//!        ▼
//! Peripherals::apply_snapshot()
//!        │
//!        ├──▶ BoundedTimeline::push() per parameter (capacity 50)
//!        │
//!        ├──▶ evict devices of the same kind missing from the batch
//!        │
//!        └──▶ arrival forwarded to ConnectionState::record_arrival()
//! ```

pub mod catalog;
pub mod duration;
pub mod peripheral;
pub mod timeline;

pub use catalog::{DeviceLabel, DeviceType};
pub use peripheral::{Peripheral, PeripheralId, Peripherals};
pub use timeline::{BoundedTimeline, Sample, TIMELINE_CAPACITY};
