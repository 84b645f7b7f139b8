//! Parse, dedup and upload for each artifact event.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::directory::{relative_to, ArtifactEvent};
use super::error::WatcherError;
use crate::artifact::{resolve_dependencies, ArtifactSource, Project};
use crate::sync::{upload_contract, SyncSession, UploadReport};

/// Consumes artifact events one at a time.
///
/// The dedup check and record happen together in [`handle`](Self::handle)
/// before any upload starts, so two events for the same unchanged contract
/// cannot both pass the gate.
#[derive(Debug, Clone)]
pub struct ArtifactPipeline {
    session: Arc<SyncSession>,
}

impl ArtifactPipeline {
    #[must_use]
    pub fn new(session: Arc<SyncSession>) -> Self {
        Self { session }
    }

    /// Process one changed file and spawn an upload per changed contract.
    ///
    /// Files are read on the blocking pool. Parse errors are logged and the
    /// file is skipped.
    pub async fn handle(
        &self,
        project: &Arc<Project>,
        path: &Path,
    ) -> Vec<JoinHandle<UploadReport>> {
        if !project.accepts(path) {
            return Vec::new();
        }
        let file = relative_to(path, project.watch_root());

        let parsed = {
            let project = Arc::clone(project);
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || project.parse(&path)).await
        };
        let artifacts = match parsed {
            Ok(Ok(artifacts)) => artifacts,
            Ok(Err(e)) if e.is_not_found() && e.path() == path => {
                tracing::debug!(file = %file.display(), "Artifact removed before it was read");
                return Vec::new();
            }
            Ok(Err(e)) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping unreadable artifact");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Artifact parser task failed");
                return Vec::new();
            }
        };

        let mut uploads = Vec::new();
        for artifact in artifacts {
            if !self.session.dedup().observe(&artifact.name, Some(artifact.address.as_str())) {
                tracing::debug!(
                    contract = %artifact.name,
                    address = %artifact.address,
                    "Contract unchanged"
                );
                continue;
            }
            tracing::info!(
                contract = %artifact.name,
                address = %artifact.address,
                file = %file.display(),
                "Contract changed"
            );

            let session = Arc::clone(&self.session);
            let project = Arc::clone(project);
            uploads.push(tokio::spawn(async move {
                let resolved = tokio::task::spawn_blocking(move || {
                    let mut artifact = artifact;
                    artifact.dependencies = resolve_dependencies(project.as_ref(), &artifact);
                    artifact
                })
                .await;
                match resolved {
                    Ok(artifact) => upload_contract(&session, &artifact).await,
                    Err(e) => {
                        tracing::error!(error = %e, "Dependency resolution task failed");
                        UploadReport::default()
                    }
                }
            }));
        }
        uploads
    }

    /// Handle events until cancelled.
    ///
    /// Uploads are not awaited; in-flight uploads are abandoned on exit.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::ChannelClosed`] if the event source goes away.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<ArtifactEvent>,
        cancel: CancellationToken,
    ) -> Result<(), WatcherError> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                event = events.recv() => {
                    let Some(event) = event else {
                        return Err(WatcherError::ChannelClosed);
                    };
                    self.handle(&event.project, &event.path).await;
                }
            }
        }
    }
}
