//! # robowatch
//!
//! Session-state engine for a robot controller console.
//!
//! The crate tracks whether the console is receiving live telemetry, keeps a
//! bounded history of peripheral readings reported by the controller, and
//! makes editor operations wait for the user before they throw away unsaved
//! work.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                             │
//! │  ┌─────────┐  TransportEvent  ┌──────────────────────────┐  │
//! │  │ source  │─────────────────▶│      SessionStore        │  │
//! │  └─────────┘                  │  ┌────────────────────┐  │  │
//! │  FileSource | StreamSource    │  │ data::Peripherals  │  │  │
//! │  | ChannelSource              │  └─────────┬──────────┘  │  │
//! │                               │            │ arrivals    │  │
//! │  tick (200 ms) ──────────────▶│  ┌─────────▼──────────┐  │  │
//! │                               │  │ health::Connection │  │  │
//! │                               │  └────────────────────┘  │  │
//! │  ┌─────────┐  ┌─────────┐     │  ConfirmationView        │  │
//! │  │ editor  │─▶│  gate   │────▶│  EditorState, logs       │  │
//! │  └─────────┘  └─────────┘     └──────────────────────────┘  │
//! │  ┌─────────┐                                                 │
//! │  │ control │── RpcClient ──▶ controller                      │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`store`]**: The shared observable [`SessionState`] behind a [`SessionStore`]
//! - **[`health`]**: Arrival-rate estimation and link status ([`ConnectionState`])
//! - **[`data`]**: Peripheral telemetry merge and eviction ([`Peripherals`])
//! - **[`gate`]**: The confirmation protocol ([`ConfirmationGate`])
//! - **[`editor`]**: Create/open/save/download guarded by the gate ([`EditorSession`])
//! - **[`control`]**: Run-mode changes over RPC ([`ModeController`])
//! - **[`source`]**: Transport sources ([`TelemetrySource`] trait)
//! - **[`session`]**: The driver loop tying sources and ticks together ([`Session`])
//!
//! ## Usage
//!
//! ### Feeding telemetry from an in-process producer
//!
//! ```
//! use robowatch::{ChannelSource, Session, Settings};
//! use robowatch_types::{PeripheralKind, TelemetryBatch};
//!
//! let (tx, source) = ChannelSource::create("runtime bridge");
//! let mut session = Session::new(Box::new(source), Settings::default());
//!
//! let batch = TelemetryBatch::builder(PeripheralKind::SmartDevice)
//!     .timestamp_ms(1000)
//!     .device(5u64, |d| d.param("switch0", true))
//!     .build();
//! tx.try_send(batch.into()).unwrap();
//!
//! session.pump();
//! assert_eq!(session.store().read(|s| s.peripherals.len()), 1);
//! ```
//!
//! ### Connecting over TCP
//!
//! ```no_run
//! use robowatch::{Session, Settings, StreamSource};
//!
//! # tokio_test::block_on(async {
//! let stream = tokio::net::TcpStream::connect("192.168.0.1:8101").await.unwrap();
//! let source = StreamSource::spawn(stream, "robot");
//! let mut session = Session::new(Box::new(source), Settings::default());
//! session.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
//! # });
//! ```

pub mod collab;
pub mod config;
pub mod control;
pub mod data;
pub mod editor;
pub mod error;
pub mod gate;
pub mod health;
pub mod session;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use collab::{
    FileAccess, LocalFiles, LogDisplay, Notifier, PathPrompt, RemoteCopy, RpcClient,
    TracingNotifier,
};
pub use config::Settings;
pub use control::ModeController;
pub use data::{BoundedTimeline, DeviceType, Peripheral, PeripheralId, Peripherals};
pub use editor::{DialogChoice, EditorSession};
pub use error::{ConsoleError, Result};
pub use gate::{ConfirmationGate, RequestId, Resolution};
pub use health::{ConnectionState, ConnectionStatus, StatusView};
pub use session::Session;
pub use source::{ChannelSource, FileSource, StreamSource, TelemetrySource};
pub use store::{ConfirmationView, EditorState, LogHistory, SessionState, SessionStore};
