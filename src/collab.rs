//! Collaborators the session engine drives but does not implement.
//!
//! The console shell supplies these: a call layer to the controller, file
//! dialogs, a secure copy channel, and user notifications. [`LocalFiles`]
//! and [`TracingNotifier`] are ready-made implementations for local use.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::config::RemoteSettings;
use crate::error::Result;

/// Request/response and fire-and-forget calls to controller services.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Call `service.method` and wait for its result.
    async fn invoke(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value>;

    /// Send `service.method` without waiting for a reply.
    fn notify(&self, service: &str, method: &str) -> Result<()>;
}

/// Asks the user where to open or save a file.
///
/// `None` means the user dismissed the dialog.
#[async_trait]
pub trait PathPrompt: Send + Sync {
    async fn open_path(&self) -> Option<PathBuf>;

    async fn save_path(&self, current: Option<&Path>) -> Option<PathBuf>;
}

/// Reads and writes editor files.
#[async_trait]
pub trait FileAccess: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String>;

    async fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Copies student code to and from the controller.
#[async_trait]
pub trait RemoteCopy: Send + Sync {
    async fn upload(&self, remote: &RemoteSettings, path: &str, contents: &str) -> Result<()>;

    async fn download(&self, remote: &RemoteSettings, path: &str) -> Result<String>;
}

/// Surfaces outcomes to the user.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Brings the controller log display into view.
pub trait LogDisplay: Send + Sync {
    fn open(&self);
}

/// UTF-8 files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

#[async_trait]
impl FileAccess for LocalFiles {
    async fn read(&self, path: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<()> {
        Ok(tokio::fs::write(path, contents).await?)
    }
}

/// Reports notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studentcode.py");

        LocalFiles.write(&path, "def autonomous_setup():\n    pass\n").await.unwrap();
        let back = LocalFiles.read(&path).await.unwrap();
        assert!(back.starts_with("def autonomous_setup"));
    }

    #[tokio::test]
    async fn test_local_files_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFiles.read(&dir.path().join("missing.py")).await.unwrap_err();
        assert!(matches!(err, crate::error::ConsoleError::Io(_)));
    }
}
