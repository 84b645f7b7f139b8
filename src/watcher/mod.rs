//! Artifact ingestion: directory watches and the per-event sync pipeline.

mod directory;
mod error;
mod pipeline;

pub use directory::{detect_projects, relative_to, ArtifactEvent, DirectoryWatcher};
pub use error::WatcherError;
pub use pipeline::ArtifactPipeline;
