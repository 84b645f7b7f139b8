//! `listen`: run the artifact and chain feeds until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::CommandError;
use super::session::connect;
use crate::chain::{ChainFeed, FeedOptions, HttpProvider, StructuralTraceDecoder};
use crate::config::{AgentConfig, CredentialStore};
use crate::sync::{SessionOptions, SyncSession};
use crate::watcher::{detect_projects, ArtifactPipeline, DirectoryWatcher};

/// Options of the `listen` command.
#[derive(Debug, Clone, Default)]
pub struct ListenOptions {
    pub workspace: Option<String>,
    /// Project directories; the configured ones when empty.
    pub directories: Vec<PathBuf>,
    /// Forward block numbers only and skip artifact watching.
    pub server: bool,
    /// Watch artifacts only.
    pub local: bool,
    pub ast_upload: bool,
}

/// Which feeds a listen session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPlan {
    pub artifacts: bool,
    pub chain: bool,
    pub server_side: bool,
}

impl FeedPlan {
    /// `--local` wins over `--server`.
    #[must_use]
    pub fn from_options(options: &ListenOptions) -> Self {
        if options.local {
            if options.server {
                tracing::warn!("--server is ignored in local mode");
            }
            return Self {
                artifacts: true,
                chain: false,
                server_side: false,
            };
        }
        Self {
            artifacts: !options.server,
            chain: true,
            server_side: options.server,
        }
    }
}

/// Run the listen session until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the session cannot be set up; once running, feed
/// and upload failures are logged and retried or skipped.
pub async fn listen(
    config: &AgentConfig,
    store: &CredentialStore,
    options: ListenOptions,
    cancel: CancellationToken,
) -> Result<(), CommandError> {
    let plan = FeedPlan::from_options(&options);
    let client = connect(config, store, options.workspace.as_deref()).await?;
    let session = Arc::new(SyncSession::new(
        Arc::new(client),
        SessionOptions {
            ast_upload: options.ast_upload || config.ast_upload,
        },
    )?);
    let workspace = session.workspace().clone();

    let mut feed = if plan.chain {
        let provider = Arc::new(HttpProvider::new(&workspace.rpc_server)?);
        Some(ChainFeed::new(
            provider,
            Arc::new(StructuralTraceDecoder),
            Arc::clone(&session),
            FeedOptions {
                server_side: plan.server_side,
                reconnect: true,
                poll_interval: config.poll_interval(),
                reconnect_delay: config.reconnect_delay(),
            },
        ))
    } else {
        None
    };

    let watch = if plan.artifacts {
        let directories = if options.directories.is_empty() {
            config.directories.clone()
        } else {
            options.directories
        };
        let projects = detect_projects(&directories, &workspace.network_id);
        let (watcher, events) = DirectoryWatcher::new(projects)?;
        (!watcher.is_empty()).then_some((watcher, events))
    } else {
        None
    };

    let pipeline = ArtifactPipeline::new(Arc::clone(&session));
    let artifacts = async {
        match watch {
            Some((_watcher, events)) => pipeline.run(events, cancel.clone()).await?,
            None => cancel.cancelled().await,
        }
        Ok::<(), CommandError>(())
    };
    let chain = async {
        match feed.as_mut() {
            Some(feed) => feed.run(cancel.clone()).await?,
            None => cancel.cancelled().await,
        }
        Ok::<(), CommandError>(())
    };

    tokio::try_join!(artifacts, chain)?;
    tracing::info!(workspace = %workspace.name, "Listen session stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_runs_both_feeds() {
        let plan = FeedPlan::from_options(&ListenOptions::default());
        assert!(plan.artifacts && plan.chain && !plan.server_side);
    }

    #[test]
    fn test_server_plan_skips_artifacts() {
        let plan = FeedPlan::from_options(&ListenOptions {
            server: true,
            ..ListenOptions::default()
        });
        assert!(!plan.artifacts);
        assert!(plan.chain && plan.server_side);
    }

    #[test]
    fn test_local_overrides_server() {
        let plan = FeedPlan::from_options(&ListenOptions {
            server: true,
            local: true,
            ..ListenOptions::default()
        });
        assert!(plan.artifacts);
        assert!(!plan.chain && !plan.server_side);
    }
}
