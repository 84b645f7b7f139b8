//! Filesystem watches over build-tool artifact directories.
//!
//! Bridges notify callbacks to a tokio mpsc channel consumed by the
//! artifact pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatcherError;
use crate::artifact::{detect_project, ArtifactSource, Detection, Project};
use crate::display;

/// A changed file inside a watched project.
#[derive(Debug, Clone)]
pub struct ArtifactEvent {
    pub project: Arc<Project>,
    pub path: PathBuf,
}

/// Detect the build tool of each directory.
///
/// Hardhat and unrecognized directories are reported and skipped, as are
/// directories whose project config cannot be read.
#[must_use]
pub fn detect_projects(directories: &[PathBuf], network_id: &str) -> Vec<Project> {
    let mut projects = Vec::new();
    for dir in directories {
        match detect_project(dir, network_id) {
            Ok(Detection::Supported(project)) => {
                display::print_project_detected(&project.kind().to_string(), dir);
                if let Project::Brownie(brownie) = &project {
                    if !brownie.has_dev_deployments() {
                        display::print_notice(
                            "Brownie dev deployments not found, set `dev_deployment_artifacts: true` in brownie-config.yaml to sync them",
                        );
                    }
                }
                projects.push(project);
            }
            Ok(Detection::Hardhat(root)) => display::print_hardhat_notice(&root),
            Ok(Detection::Unrecognized(root)) => {
                tracing::info!(dir = %root.display(), "No supported project config found");
                display::print_unrecognized_project(&root);
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping directory");
                display::print_error(&e.to_string());
            }
        }
    }
    projects
}

/// Where to attach the watch for a project.
///
/// Build output directories often do not exist before the first compile or
/// deployment, so the nearest existing ancestor is watched recursively
/// instead and events are filtered by the project.
fn watch_target(project: &Project) -> Option<(PathBuf, RecursiveMode)> {
    let root = project.watch_root();
    if root.is_dir() {
        let mode = if project.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        return Some((root.to_path_buf(), mode));
    }
    root.ancestors()
        .skip(1)
        .find(|dir| dir.is_dir())
        .map(|dir| (dir.to_path_buf(), RecursiveMode::Recursive))
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// Artifact files already present under a project's watch root.
fn existing_artifacts(project: &Project) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![project.watch_root().to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Cannot list directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if project.recursive() {
                    pending.push(path);
                }
            } else if project.accepts(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

/// Keeps the filesystem watches of all detected projects alive.
pub struct DirectoryWatcher {
    projects: Vec<Arc<Project>>,
    watchers: Vec<RecommendedWatcher>,
}

impl DirectoryWatcher {
    /// Attach a watch to each project's artifact location.
    ///
    /// Returns the watcher and a receiver for artifact events. Files already
    /// present are sent as events once the watches are attached.
    ///
    /// # Errors
    ///
    /// Returns an error if a filesystem watch cannot be created.
    pub fn new(
        projects: Vec<Project>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ArtifactEvent>), WatcherError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watchers = Vec::with_capacity(projects.len());
        let projects: Vec<Arc<Project>> = projects.into_iter().map(Arc::new).collect();

        for project in &projects {
            let Some((target, mode)) = watch_target(project) else {
                tracing::warn!(root = %project.watch_root().display(), "Nothing to watch");
                continue;
            };

            let tx = event_tx.clone();
            let watched = Arc::clone(project);
            let mut watcher =
                notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
                    Ok(event) if is_content_change(&event.kind) => {
                        for path in event.paths {
                            if watched.accepts(&path) {
                                let _ = tx.send(ArtifactEvent {
                                    project: Arc::clone(&watched),
                                    path,
                                });
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "File watcher error"),
                })?;
            watcher.watch(&target, mode)?;
            tracing::info!(
                kind = %project.kind(),
                target = %target.display(),
                recursive = matches!(mode, RecursiveMode::Recursive),
                "Watching artifacts"
            );
            watchers.push(watcher);

            for path in existing_artifacts(project) {
                event_tx
                    .send(ArtifactEvent {
                        project: Arc::clone(project),
                        path,
                    })
                    .map_err(|_| WatcherError::ChannelClosed)?;
            }
        }

        Ok((
            Self {
                projects,
                watchers,
            },
            event_rx,
        ))
    }

    #[must_use]
    pub fn projects(&self) -> &[Arc<Project>] {
        &self.projects
    }

    /// Whether any project is being watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("projects", &self.projects)
            .field("watches", &self.watchers.len())
            .finish()
    }
}

/// Paths relative to the project root, for log lines.
#[must_use]
pub fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
