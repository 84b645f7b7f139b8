//! Contract artifact parsing for Truffle, Brownie and Foundry projects.

mod brownie;
mod dependencies;
mod error;
mod foundry;
mod project;
mod truffle;
mod types;

use std::fmt;
use std::path::Path;

pub use brownie::BrownieProject;
pub use dependencies::{exported_dependencies, resolve_dependencies};
pub use error::ArtifactError;
pub use foundry::{CompiledLocation, FoundryLayout, FoundryProject};
pub use project::{detect_project, Detection};
pub use truffle::{TruffleProject, DEFAULT_BUILD_DIR};
pub use types::{ContractArtifact, Dependencies, DependencyBundle};

/// Supported build tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectKind {
    Truffle,
    Brownie,
    Foundry,
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Truffle => "Truffle",
            Self::Brownie => "Brownie",
            Self::Foundry => "Foundry",
        };
        f.write_str(name)
    }
}

/// Parsing strategy for one build tool's output.
pub trait ArtifactSource: Send + Sync {
    /// Directory the filesystem watch is attached to.
    fn watch_root(&self) -> &Path;

    /// Whether the watch must descend into subdirectories.
    fn recursive(&self) -> bool;

    /// Whether a changed path is an artifact this tool produces.
    fn accepts(&self, path: &Path) -> bool;

    /// Parse a changed file into the deployed contracts it describes.
    ///
    /// Contracts not deployed on the active network are left out, so an
    /// empty result means there is nothing to sync. Dependencies are not
    /// resolved here.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    fn parse(&self, path: &Path) -> Result<Vec<ContractArtifact>, ArtifactError>;

    /// Load a dependency's bundle by contract name, `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependency's file exists but is malformed.
    fn load_dependency(&self, name: &str) -> Result<Option<DependencyBundle>, ArtifactError>;
}

/// A detected project, dispatching to its build tool's strategy.
#[derive(Debug, Clone)]
pub enum Project {
    Truffle(TruffleProject),
    Brownie(BrownieProject),
    Foundry(FoundryProject),
}

impl Project {
    #[must_use]
    pub fn kind(&self) -> ProjectKind {
        match self {
            Self::Truffle(_) => ProjectKind::Truffle,
            Self::Brownie(_) => ProjectKind::Brownie,
            Self::Foundry(_) => ProjectKind::Foundry,
        }
    }

    fn inner(&self) -> &dyn ArtifactSource {
        match self {
            Self::Truffle(p) => p,
            Self::Brownie(p) => p,
            Self::Foundry(p) => p,
        }
    }
}

impl ArtifactSource for Project {
    fn watch_root(&self) -> &Path {
        self.inner().watch_root()
    }

    fn recursive(&self) -> bool {
        self.inner().recursive()
    }

    fn accepts(&self, path: &Path) -> bool {
        self.inner().accepts(path)
    }

    fn parse(&self, path: &Path) -> Result<Vec<ContractArtifact>, ArtifactError> {
        self.inner().parse(path)
    }

    fn load_dependency(&self, name: &str) -> Result<Option<DependencyBundle>, ArtifactError> {
        self.inner().load_dependency(name)
    }
}
