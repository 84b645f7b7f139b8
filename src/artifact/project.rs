//! Build-tool detection for a watched directory.

use std::path::{Path, PathBuf};

use super::brownie::{self, BrownieProject};
use super::error::ArtifactError;
use super::foundry::{self, FoundryProject};
use super::truffle::{self, TruffleProject};
use super::Project;

/// Hardhat config files; Hardhat is detected but synced by its own plugin.
const HARDHAT_CONFIG_FILES: &[&str] = &["hardhat.config.js", "hardhat.config.ts"];

/// Outcome of inspecting a directory for a build tool.
#[derive(Debug)]
pub enum Detection {
    /// A supported project whose artifacts can be watched.
    Supported(Project),
    /// A Hardhat project.
    Hardhat(PathBuf),
    /// No recognized config file.
    Unrecognized(PathBuf),
}

fn find_config(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

/// Detect the build tool of `dir` by config-file presence, in priority
/// order Truffle, Brownie, Foundry, Hardhat.
///
/// The directory is canonicalized so artifact paths reported by the
/// filesystem watcher can be matched against it.
///
/// # Errors
///
/// Returns an error if the directory cannot be resolved or a detected
/// project's config file is malformed.
pub fn detect_project(dir: &Path, network_id: &str) -> Result<Detection, ArtifactError> {
    let root = dir.canonicalize().map_err(|e| ArtifactError::io(dir, e))?;

    if let Some(config) = find_config(&root, truffle::CONFIG_FILES) {
        return Ok(Detection::Supported(Project::Truffle(TruffleProject::detect(
            &root, &config, network_id,
        ))));
    }
    if find_config(&root, &[brownie::CONFIG_FILE]).is_some() {
        return Ok(Detection::Supported(Project::Brownie(BrownieProject::new(root))));
    }
    if let Some(config) = find_config(&root, &[foundry::CONFIG_FILE]) {
        return Ok(Detection::Supported(Project::Foundry(FoundryProject::detect(
            &root, &config,
        )?)));
    }
    if find_config(&root, HARDHAT_CONFIG_FILES).is_some() {
        return Ok(Detection::Hardhat(root));
    }
    Ok(Detection::Unrecognized(root))
}
