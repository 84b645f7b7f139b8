//! Command error types.

use crate::chain::ProviderError;
use crate::config::{ConfigError, CredentialsError};
use crate::sync::SyncError;
use crate::watcher::WatcherError;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No API token stored or in the environment.
    #[error("You need to be logged in, run `ethernal login` first")]
    NotLoggedIn,

    /// The block range is empty or reversed.
    #[error("Invalid block range: --from ({from}) must be lower than --to ({to})")]
    InvalidRange { from: u64, to: u64 },

    /// A required value was left empty.
    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Watcher(#[from] WatcherError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
