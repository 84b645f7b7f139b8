//! The state shared by the artifact and chain feeds of one sync session.

use std::sync::Arc;

use super::backend::Backend;
use super::dedup::AddressDedupTracker;
use super::error::SyncError;
use super::types::Workspace;

/// Options fixed for the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upload contract and dependency ASTs for storage decoding.
    pub ast_upload: bool,
}

/// An authenticated session bound to one workspace.
///
/// Owns the dedup tracker; watchers and feeds receive an `Arc` of it.
pub struct SyncSession {
    backend: Arc<dyn Backend>,
    workspace: Workspace,
    dedup: AddressDedupTracker,
    options: SessionOptions,
}

impl SyncSession {
    /// Bind a session to the backend's selected workspace.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoWorkspace`] if the backend has none selected.
    pub fn new(backend: Arc<dyn Backend>, options: SessionOptions) -> Result<Self, SyncError> {
        let workspace = backend
            .workspace()
            .cloned()
            .ok_or(SyncError::NoWorkspace("session"))?;
        Ok(Self {
            backend,
            workspace,
            dedup: AddressDedupTracker::new(),
            options,
        })
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    #[must_use]
    pub fn dedup(&self) -> &AddressDedupTracker {
        &self.dedup
    }

    #[must_use]
    pub fn options(&self) -> SessionOptions {
        self.options
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("workspace", &self.workspace.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
