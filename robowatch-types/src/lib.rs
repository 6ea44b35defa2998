//! # robowatch-types
//!
//! Wire types shared between a remote controller's transport layer and the
//! robowatch console. A controller publishes periodic telemetry batches (one
//! per peripheral class) and discrete log events; the console consumes them
//! to track connection health and per-device parameter history.
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use robowatch_types::{DeviceId, ParamValue, PeripheralKind, TelemetryBatch};
//!
//! let batch = TelemetryBatch::builder(PeripheralKind::SmartDevice)
//!     .timestamp_ms(1_000)
//!     .device(DeviceId::new(5), |d| d.param("switch0", true))
//!     .build();
//!
//! assert_eq!(batch.samples.len(), 1);
//! assert_eq!(
//!     batch.samples[&DeviceId::new(5)]["switch0"],
//!     ParamValue::Bool(true)
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod batch;
mod device;
mod log;
mod mode;
mod value;

pub use batch::*;
pub use device::*;
pub use log::*;
pub use mode::*;
pub use value::*;
