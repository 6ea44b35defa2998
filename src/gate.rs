//! Confirmation gate for operations that would discard unsaved work.
//!
//! An operation calls [`ConfirmationGate::request_confirmation`] and waits.
//! The request is published to the session state as
//! [`ConfirmationView`](crate::store::ConfirmationView) so a dialog can render
//! it without knowing who asked. Whoever renders the dialog answers with
//! [`ConfirmationGate::resolve`] or [`ConfirmationGate::resolve_request`].
//!
//! Each request gets its own one-shot channel. Only one request may be
//! outstanding; a second caller is turned away with
//! [`ConsoleError::ConfirmationBusy`] instead of sharing the first caller's
//! answer.
//!
//! ```text
//! request_confirmation()          dialog
//!        │                          │
//!        ├── pending = true ───────▶│
//!        │                          │ resolve(Confirmed | Cancelled)
//!        │◀──────── oneshot ────────┤
//!        ├── pending = false        │
//!        ▼
//!   Ok(()) | Aborted | ConfirmationTimedOut
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::GateSettings;
use crate::error::{ConsoleError, Result};
use crate::store::{ConfirmationView, SessionStore};

/// Identifies one confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The user's answer to a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Go ahead with the operation.
    Confirmed,
    /// Back out; the operation fails with [`ConsoleError::Aborted`].
    Cancelled,
}

struct Outstanding {
    id: RequestId,
    tx: oneshot::Sender<Resolution>,
}

struct Shared {
    next_id: AtomicU64,
    outstanding: Mutex<Option<Outstanding>>,
}

/// Cloneable handle; all clones share the same outstanding request.
#[derive(Clone)]
pub struct ConfirmationGate {
    store: SessionStore,
    timeout: Duration,
    shared: Arc<Shared>,
}

impl fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("timeout", &self.timeout)
            .field("pending", &self.pending())
            .finish()
    }
}

impl ConfirmationGate {
    pub fn new(store: SessionStore, settings: &GateSettings) -> Self {
        Self {
            store,
            timeout: settings.timeout,
            shared: Arc::new(Shared {
                next_id: AtomicU64::new(1),
                outstanding: Mutex::new(None),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<RequestId> {
        self.shared.outstanding.lock().as_ref().map(|o| o.id)
    }

    /// Ask the user to confirm and wait for the answer.
    ///
    /// Resolves `Ok(())` on [`Resolution::Confirmed`]. Fails with
    /// [`ConsoleError::Aborted`] on [`Resolution::Cancelled`] or when the
    /// request is dismissed, and with [`ConsoleError::ConfirmationTimedOut`]
    /// if nobody answers in time.
    pub async fn request_confirmation(&self) -> Result<()> {
        let (id, rx) = {
            let mut outstanding = self.shared.outstanding.lock();
            if let Some(current) = outstanding.as_ref() {
                warn!("Confirmation {} still pending, rejecting new request", current.id);
                return Err(ConsoleError::ConfirmationBusy);
            }
            let id = RequestId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
            let (tx, rx) = oneshot::channel();
            *outstanding = Some(Outstanding { id, tx });
            (id, rx)
        };

        self.store.update(|state| {
            state.confirmation = ConfirmationView {
                pending: true,
                request: Some(id),
            };
        });
        debug!("Confirmation {} requested", id);

        // Clears the request if this future is dropped before an answer.
        let _guard = PendingGuard { gate: self, id };

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Resolution::Confirmed)) => {
                info!("Confirmation {} confirmed", id);
                Ok(())
            }
            Ok(Ok(Resolution::Cancelled)) => {
                info!("Confirmation {} cancelled", id);
                Err(ConsoleError::Aborted)
            }
            Ok(Err(_)) => {
                debug!("Confirmation {} dismissed", id);
                Err(ConsoleError::Aborted)
            }
            Err(_) => {
                warn!("Confirmation {} not resolved within {:?}", id, self.timeout);
                Err(ConsoleError::ConfirmationTimedOut(self.timeout))
            }
        }
    }

    /// Answer the outstanding request.
    ///
    /// Returns false if nothing was pending.
    pub fn resolve(&self, resolution: Resolution) -> bool {
        let taken = self.shared.outstanding.lock().take();
        match taken {
            Some(outstanding) => {
                self.deliver(outstanding, resolution);
                true
            }
            None => {
                debug!("No confirmation pending, ignoring {:?}", resolution);
                false
            }
        }
    }

    /// Answer a specific request; stale ids are ignored.
    pub fn resolve_request(&self, id: RequestId, resolution: Resolution) -> bool {
        let taken = {
            let mut outstanding = self.shared.outstanding.lock();
            match outstanding.as_ref() {
                Some(current) if current.id == id => outstanding.take(),
                _ => None,
            }
        };
        match taken {
            Some(outstanding) => {
                self.deliver(outstanding, resolution);
                true
            }
            None => {
                debug!("Confirmation {} is not pending, ignoring {:?}", id, resolution);
                false
            }
        }
    }

    /// Drop the outstanding request without an answer.
    ///
    /// The waiting operation fails with [`ConsoleError::Aborted`]. Used on
    /// teardown so nothing is left waiting for the timeout.
    pub fn dismiss(&self) -> bool {
        let taken = self.shared.outstanding.lock().take();
        match taken {
            Some(outstanding) => {
                self.clear_view(outstanding.id);
                true
            }
            None => false,
        }
    }

    fn deliver(&self, outstanding: Outstanding, resolution: Resolution) {
        let id = outstanding.id;
        if outstanding.tx.send(resolution).is_err() {
            debug!("Confirmation {} was abandoned before {:?} arrived", id, resolution);
        }
        self.clear_view(id);
    }

    fn clear_view(&self, id: RequestId) {
        self.store.update(|state| {
            if state.confirmation.request == Some(id) {
                state.confirmation = ConfirmationView::default();
            }
        });
    }
}

struct PendingGuard<'a> {
    gate: &'a ConfirmationGate,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut outstanding = self.gate.shared.outstanding.lock();
        if outstanding.as_ref().is_some_and(|o| o.id == self.id) {
            outstanding.take();
        }
        drop(outstanding);
        if self.gate.store.read(|s| s.confirmation.request == Some(self.id)) {
            self.gate.clear_view(self.id);
        }
    }
}
