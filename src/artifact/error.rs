//! Artifact parsing error types.

use std::path::{Path, PathBuf};

/// Errors that can occur while reading build-tool output.
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// Artifact file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact file is not valid JSON.
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A field the build tool always writes is absent.
    #[error("Missing field `{field}` in {path}")]
    MissingField { path: PathBuf, field: &'static str },

    /// Project configuration file could not be parsed.
    #[error("Failed to parse project config {path}: {source}")]
    ProjectConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// File the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::MissingField { path, .. }
            | Self::ProjectConfig { path, .. } => path,
        }
    }

    /// Whether the error means the file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
