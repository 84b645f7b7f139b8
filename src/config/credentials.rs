//! Stored login credentials.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the stored API token.
pub const API_TOKEN_ENV: &str = "ETHERNAL_API_TOKEN";

/// What `login` persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub api_token: Option<String>,
}

/// Reads and writes the credentials file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `<config_dir>/ethernal/credentials.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no config directory.
    pub fn new() -> Result<Self, CredentialsError> {
        let dir = dirs::config_dir().ok_or(CredentialsError::NoConfigDir)?;
        Ok(Self::with_path(dir.join("ethernal").join("credentials.toml")))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored credentials, empty if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Credentials, CredentialsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Credentials::default()),
            Err(e) => return Err(self.io(e)),
        };
        toml::from_str(&content).map_err(|e| CredentialsError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// API token, from the environment first, then the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials file is unreadable.
    pub fn api_token(&self) -> Result<Option<String>, CredentialsError> {
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(Some(token));
            }
        }
        Ok(self.load()?.api_token)
    }

    /// Persist credentials, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io(e))?;
        }
        let content = toml::to_string(credentials)?;
        std::fs::write(&self.path, content).map_err(|e| self.io(e))?;
        tracing::debug!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    fn io(&self, source: std::io::Error) -> CredentialsError {
        CredentialsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Errors from the credentials file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("No user config directory on this platform")]
    NoConfigDir,

    #[error("Failed to access credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[from] toml::ser::Error),
}
