//! Watcher error types.

/// Errors that can occur while watching artifact directories.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// A watch could not be attached.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The event channel's other end is gone.
    #[error("Artifact event channel closed")]
    ChannelClosed,
}
