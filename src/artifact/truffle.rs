//! Truffle build output: one JSON artifact per contract in the build directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::error::ArtifactError;
use super::types::{hash_bytecode, normalize_address, read_json, ContractArtifact, DependencyBundle};
use super::ArtifactSource;

/// Default `contracts_build_directory`, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = "build/contracts";

/// Artifact Truffle writes for its own migration bookkeeping.
const MIGRATIONS_ARTIFACT: &str = "Migrations.json";

/// Config file names Truffle looks for, in order.
pub const CONFIG_FILES: &[&str] = &["truffle-config.js", "truffle.js"];

/// A Truffle project bound to one network.
#[derive(Debug, Clone)]
pub struct TruffleProject {
    build_dir: PathBuf,
    network_id: String,
}

impl TruffleProject {
    /// Create a project reading artifacts from `build_dir`.
    #[must_use]
    pub fn new(build_dir: PathBuf, network_id: impl Into<String>) -> Self {
        Self {
            build_dir,
            network_id: network_id.into(),
        }
    }

    /// Create a project from its root, reading the build directory from the
    /// config file when it sets one literally.
    #[must_use]
    pub fn detect(root: &Path, config_file: &Path, network_id: impl Into<String>) -> Self {
        let configured = std::fs::read_to_string(config_file)
            .ok()
            .and_then(|content| configured_build_dir(&content));
        let build_dir = root.join(configured.as_deref().unwrap_or(DEFAULT_BUILD_DIR));
        Self::new(build_dir, network_id)
    }
}

/// Extract a literal `contracts_build_directory` from a Truffle config.
///
/// Handles both `"./out"` and `path.join(__dirname, "out")` forms.
fn configured_build_dir(config: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(
            r#"contracts_build_directory\s*:\s*(?:path\.(?:join|resolve)\(\s*__dirname\s*,\s*)?["'`]([^"'`]+)["'`]"#,
        )
        .ok()
    });
    pattern
        .as_ref()?
        .captures(config)
        .map(|caps| caps[1].trim_start_matches("./").to_string())
}

impl ArtifactSource for TruffleProject {
    fn watch_root(&self) -> &Path {
        &self.build_dir
    }

    fn recursive(&self) -> bool {
        false
    }

    fn accepts(&self, path: &Path) -> bool {
        path.parent() == Some(self.build_dir.as_path())
            && path.extension().is_some_and(|ext| ext == "json")
            && path.file_name().is_some_and(|name| name != MIGRATIONS_ARTIFACT)
    }

    fn parse(&self, path: &Path) -> Result<Vec<ContractArtifact>, ArtifactError> {
        if path.file_name().is_some_and(|name| name == MIGRATIONS_ARTIFACT) {
            return Ok(Vec::new());
        }

        let json = read_json(path)?;
        let name = json
            .get("contractName")
            .and_then(Value::as_str)
            .ok_or_else(|| ArtifactError::MissingField {
                path: path.to_path_buf(),
                field: "contractName",
            })?;

        let Some(address) = json
            .pointer(&format!("/networks/{}/address", self.network_id))
            .and_then(Value::as_str)
            .and_then(normalize_address)
        else {
            tracing::debug!(contract = %name, network_id = %self.network_id, "Not deployed on this network");
            return Ok(Vec::new());
        };

        Ok(vec![ContractArtifact {
            name: name.to_string(),
            address,
            abi: json.get("abi").cloned().unwrap_or(Value::Null),
            ast: json.get("ast").cloned().unwrap_or(Value::Null),
            source: json.get("source").and_then(Value::as_str).map(String::from),
            hashed_bytecode: hash_bytecode(json.get("deployedBytecode")),
            dependencies: Default::default(),
        }])
    }

    fn load_dependency(&self, name: &str) -> Result<Option<DependencyBundle>, ArtifactError> {
        let path = self.build_dir.join(format!("{name}.json"));
        match read_json(&path) {
            Ok(json) => DependencyBundle::from_artifact_json(&json, &path).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
