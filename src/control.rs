//! Run-mode control of the remote controller.

use std::sync::Arc;

use robowatch_types::{Alliance, Mode};
use tracing::{info, warn};

use crate::collab::{LogDisplay, Notifier, RpcClient};
use crate::config::ControlSettings;
use crate::error::{ConsoleError, Result};
use crate::store::SessionStore;

/// Controller service that runs student code.
pub const EXECUTOR_SERVICE: &str = "executor-service";

/// Issues mode changes and records their outcome in the session state.
///
/// Calls are not serialized: a start followed quickly by an emergency stop
/// sends both, and each updates the state when its own call completes.
pub struct ModeController {
    store: SessionStore,
    rpc: Arc<dyn RpcClient>,
    notifier: Arc<dyn Notifier>,
    log_display: Option<Arc<dyn LogDisplay>>,
    settings: ControlSettings,
}

impl ModeController {
    pub fn new(
        store: SessionStore,
        rpc: Arc<dyn RpcClient>,
        notifier: Arc<dyn Notifier>,
        settings: ControlSettings,
    ) -> Self {
        Self {
            store,
            rpc,
            notifier,
            log_display: None,
            settings,
        }
    }

    /// Attach the log display opened when a program starts.
    pub fn with_log_display(mut self, display: Arc<dyn LogDisplay>) -> Self {
        self.log_display = Some(display);
        self
    }

    /// Ask the controller to enter `requested`.
    ///
    /// An emergency stop is sent without waiting for a reply. Failures are
    /// reported through the notifier and returned; nothing is retried.
    pub async fn change_mode(&self, requested: Mode) -> Result<()> {
        let method = requested.method();
        let outcome = match requested {
            Mode::EStop => self.rpc.notify(EXECUTOR_SERVICE, method),
            _ => self
                .rpc
                .invoke(EXECUTOR_SERVICE, method, Vec::new())
                .await
                .map(|_| ()),
        };

        if let Err(err) = outcome {
            let err = match err {
                err @ ConsoleError::Rpc { .. } => err,
                other => ConsoleError::rpc(EXECUTOR_SERVICE, method, other.to_string()),
            };
            warn!("Mode change to {} failed: {}", requested.label(), err);
            self.notifier
                .error(&format!("Could not switch to {}: {}", requested.label(), err));
            return Err(err);
        }

        self.store.update(|state| state.connection.apply_mode(requested));
        info!("Mode changed to {}", requested.label());

        if requested.is_active() && self.settings.open_log_on_run {
            if let Some(display) = &self.log_display {
                display.open();
            }
        }
        Ok(())
    }

    /// Record the alliance shown on the status display.
    pub fn set_alliance(&self, alliance: Option<Alliance>) {
        self.store.update(|state| state.connection.alliance = alliance);
        match alliance {
            Some(a) => info!("Alliance set to {}", a.label()),
            None => info!("Alliance cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRpc {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl RpcClient for FakeRpc {
        async fn invoke(&self, service: &str, method: &str, _args: Vec<Value>) -> Result<Value> {
            self.calls.lock().push(format!("invoke {service}.{method}"));
            if self.fail {
                return Err(ConsoleError::rpc(service, method, "connection refused"));
            }
            Ok(Value::Null)
        }

        fn notify(&self, service: &str, method: &str) -> Result<()> {
            self.calls.lock().push(format!("notify {service}.{method}"));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter {
        errors: AtomicUsize,
        opened: AtomicUsize,
    }

    impl Notifier for Counter {
        fn success(&self, _message: &str) {}

        fn error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl LogDisplay for Counter {
        fn open(&self) {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn connected_store() -> SessionStore {
        let store = SessionStore::default();
        store.update(|s| {
            s.connection.record_arrival(0);
            s.connection.tick(100);
        });
        store
    }

    fn controller(rpc: Arc<FakeRpc>, counter: Arc<Counter>) -> (ModeController, SessionStore) {
        let store = connected_store();
        let controller =
            ModeController::new(store.clone(), rpc, counter.clone(), ControlSettings::default())
                .with_log_display(counter);
        (controller, store)
    }

    #[tokio::test]
    async fn test_start_invokes_executor_and_opens_log() {
        let rpc = Arc::new(FakeRpc::default());
        let counter = Arc::new(Counter::default());
        let (controller, store) = controller(rpc.clone(), counter.clone());

        controller.change_mode(Mode::Teleop).await.unwrap();

        assert_eq!(*rpc.calls.lock(), vec!["invoke executor-service.teleop"]);
        assert_eq!(store.read(|s| s.connection.mode), Mode::Teleop);
        assert_eq!(counter.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_estop_notifies_and_faults_idle() {
        let rpc = Arc::new(FakeRpc::default());
        let counter = Arc::new(Counter::default());
        let (controller, store) = controller(rpc.clone(), counter.clone());

        controller.change_mode(Mode::Auto).await.unwrap();
        controller.change_mode(Mode::EStop).await.unwrap();

        assert_eq!(rpc.calls.lock().last().map(String::as_str), Some("notify executor-service.estop"));
        let (mode, fault) = store.read(|s| (s.connection.mode, s.connection.error_flag));
        assert_eq!(mode, Mode::Idle);
        assert!(fault);

        controller.change_mode(Mode::Idle).await.unwrap();
        assert!(!store.read(|s| s.connection.error_flag));
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_state_kept() {
        let rpc = Arc::new(FakeRpc {
            fail: true,
            ..FakeRpc::default()
        });
        let counter = Arc::new(Counter::default());
        let (controller, store) = controller(rpc.clone(), counter.clone());

        let err = controller.change_mode(Mode::Auto).await.unwrap_err();

        assert!(matches!(err, ConsoleError::Rpc { ref method, .. } if method == "auto"));
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counter.opened.load(Ordering::SeqCst), 0);
        assert_eq!(store.read(|s| s.connection.mode), Mode::Idle);
        // No retry
        assert_eq!(rpc.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_log_display_policy_off() {
        let rpc = Arc::new(FakeRpc::default());
        let counter = Arc::new(Counter::default());
        let store = connected_store();
        let controller = ModeController::new(
            store,
            rpc,
            counter.clone(),
            ControlSettings {
                open_log_on_run: false,
            },
        )
        .with_log_display(counter.clone());

        controller.change_mode(Mode::Auto).await.unwrap();
        assert_eq!(counter.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_alliance() {
        let rpc = Arc::new(FakeRpc::default());
        let counter = Arc::new(Counter::default());
        let (controller, store) = controller(rpc, counter);

        controller.set_alliance(Some(Alliance::Gold));
        assert_eq!(store.read(|s| s.connection.view().alliance), Some(Alliance::Gold));
        controller.set_alliance(None);
        assert_eq!(store.read(|s| s.connection.alliance), None);
    }

    #[tokio::test]
    async fn test_start_while_disconnected_stays_idle() {
        let rpc = Arc::new(FakeRpc::default());
        let counter = Arc::new(Counter::default());
        let store = SessionStore::default();
        let controller =
            ModeController::new(store.clone(), rpc, counter, ControlSettings::default());

        controller.change_mode(Mode::Teleop).await.unwrap();

        let view = store.read(|s| s.connection.view());
        assert_eq!(view.mode, Mode::Idle);
        assert!(!store.read(|s| s.connection.error_flag));
    }
}
