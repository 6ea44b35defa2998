//! Editor operations guarded against losing unsaved work.
//!
//! Operations that replace the buffer (`create_file`, `open_file`,
//! `download_from_controller`) first check the dirty flag and, when set,
//! wait on the [`ConfirmationGate`]. The dialog answers through
//! [`EditorSession::resolve_unsaved`]. Saving never goes through the gate.
//!
//! ```text
//!  Clean ──edit──▶ Dirty ──create/open/save──▶ Clean
//!                    │
//!                    └──gate: Discard──▶ Clean (nothing persisted)
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::collab::{FileAccess, Notifier, PathPrompt, RemoteCopy};
use crate::config::{EditorSettings, RemoteSettings};
use crate::error::{ConsoleError, Result};
use crate::gate::{ConfirmationGate, Resolution};
use crate::store::SessionStore;

/// Choices offered by the unsaved-changes dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    /// Drop the changes and continue.
    Discard,
    /// Save the changes, then continue.
    Save,
    /// Keep the buffer and abandon the operation.
    Cancel,
}

/// Apply save-time normalization to `content`.
pub fn normalize(content: &str, settings: &EditorSettings) -> String {
    let mut out = if settings.strip_trailing_whitespace {
        content
            .split('\n')
            .map(|line| line.trim_end_matches([' ', '\t']))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        content.to_string()
    };

    if settings.ensure_trailing_newline && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Editor operations over the shared session state.
#[derive(Clone)]
pub struct EditorSession {
    store: SessionStore,
    gate: ConfirmationGate,
    prompt: Arc<dyn PathPrompt>,
    files: Arc<dyn FileAccess>,
    remote: Arc<dyn RemoteCopy>,
    notifier: Arc<dyn Notifier>,
    settings: EditorSettings,
    remote_settings: RemoteSettings,
}

impl EditorSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: SessionStore,
        gate: ConfirmationGate,
        prompt: Arc<dyn PathPrompt>,
        files: Arc<dyn FileAccess>,
        remote: Arc<dyn RemoteCopy>,
        notifier: Arc<dyn Notifier>,
        settings: EditorSettings,
        remote_settings: RemoteSettings,
    ) -> Self {
        Self {
            store,
            gate,
            prompt,
            files,
            remote,
            notifier,
            settings,
            remote_settings,
        }
    }

    pub fn content(&self) -> String {
        self.store.read(|s| s.editor.content.clone())
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.store.read(|s| s.editor.path.clone())
    }

    pub fn is_dirty(&self) -> bool {
        self.store.read(|s| s.editor.dirty)
    }

    /// Replace the buffer with user-edited content.
    pub fn edit(&self, content: impl Into<String>) {
        let content = content.into();
        self.store.update(|s| {
            s.editor.content = content;
            s.editor.dirty = true;
        });
    }

    /// Start a new, empty, unnamed buffer.
    pub async fn create_file(&self) -> Result<()> {
        self.report("New file", self.replace_with_empty()).await
    }

    /// Load a file chosen by the user.
    pub async fn open_file(&self) -> Result<()> {
        self.report("Open", self.load()).await
    }

    /// Persist the buffer, asking for a path if none is known or `save_as`.
    ///
    /// The normalized content is written back into the buffer so it matches
    /// what was saved.
    pub async fn save_file(&self, save_as: bool) -> Result<PathBuf> {
        self.report("Save", self.persist(save_as)).await
    }

    /// Answer the pending unsaved-changes dialog.
    ///
    /// `Save` persists the buffer before letting the waiting operation
    /// continue; if saving fails the operation is cancelled and the error
    /// returned.
    pub async fn resolve_unsaved(&self, choice: DialogChoice) -> Result<()> {
        debug!("Unsaved changes dialog answered: {:?}", choice);
        match choice {
            DialogChoice::Discard => {
                self.gate.resolve(Resolution::Confirmed);
                Ok(())
            }
            DialogChoice::Cancel => {
                self.gate.resolve(Resolution::Cancelled);
                Ok(())
            }
            DialogChoice::Save => match self.save_file(false).await {
                Ok(_) => {
                    self.gate.resolve(Resolution::Confirmed);
                    Ok(())
                }
                Err(err) => {
                    self.gate.resolve(Resolution::Cancelled);
                    Err(err)
                }
            },
        }
    }

    /// Replace the buffer with the code currently on the controller.
    ///
    /// The downloaded code is not saved locally, so the buffer is left dirty.
    pub async fn download_from_controller(&self) -> Result<()> {
        self.report("Download", self.fetch()).await
    }

    /// Send the buffer to the controller.
    pub async fn upload_to_controller(&self) -> Result<()> {
        self.report("Upload", self.push()).await
    }

    async fn guard_unsaved(&self) -> Result<()> {
        if self.is_dirty() {
            self.gate.request_confirmation().await
        } else {
            Ok(())
        }
    }

    async fn replace_with_empty(&self) -> Result<()> {
        self.guard_unsaved().await?;
        self.store.update(|s| s.editor.clear());
        info!("Started a new file");
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        self.guard_unsaved().await?;
        let path = self.prompt.open_path().await.ok_or(ConsoleError::Aborted)?;
        let content = self.files.read(&path).await?;
        info!("Opened {}", path.display());
        self.store.update(|s| {
            s.editor.path = Some(path);
            s.editor.content = content;
            s.editor.dirty = false;
        });
        Ok(())
    }

    async fn fetch(&self) -> Result<()> {
        self.guard_unsaved().await?;
        let remote = &self.remote_settings;
        let content = self.remote.download(remote, &remote.code_path).await?;
        self.store.update(|s| {
            s.editor.content = content;
            s.editor.dirty = true;
        });
        info!("Downloaded {} from {}", remote.code_path, remote.host);
        self.notifier.success("Downloaded code from the robot");
        Ok(())
    }

    async fn push(&self) -> Result<()> {
        let remote = &self.remote_settings;
        let content = self.content();
        self.remote.upload(remote, &remote.code_path, &content).await?;
        info!("Uploaded {} bytes to {}", content.len(), remote.host);
        self.notifier.success("Uploaded code to the robot");
        Ok(())
    }

    async fn persist(&self, save_as: bool) -> Result<PathBuf> {
        let (current, original) =
            self.store.read(|s| (s.editor.path.clone(), s.editor.content.clone()));
        let path = match current {
            Some(path) if !save_as => path,
            current => self
                .prompt
                .save_path(current.as_deref())
                .await
                .ok_or(ConsoleError::Aborted)?,
        };

        let content = normalize(&original, &self.settings);
        self.files.write(&path, &content).await?;
        info!("Saved {}", path.display());

        self.store.update(|s| {
            s.editor.path = Some(path.clone());
            // Edits made while writing stay dirty
            if s.editor.content == original {
                s.editor.content = content;
                s.editor.dirty = false;
            }
        });
        Ok(path)
    }

    async fn report<T>(&self, what: &str, op: impl Future<Output = Result<T>>) -> Result<T> {
        let result = op.await;
        if let Err(err) = &result {
            if err.is_user_abort() {
                debug!("{} cancelled", what);
            } else {
                self.notifier.error(&format!("{} failed: {}", what, err));
            }
        }
        result
    }
}
