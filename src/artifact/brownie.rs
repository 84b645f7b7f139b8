//! Brownie build output: per-deployment JSON files under `build/deployments`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::ArtifactError;
use super::types::{hash_bytecode, normalize_address, read_json, ContractArtifact, DependencyBundle};
use super::ArtifactSource;

pub const CONFIG_FILE: &str = "brownie-config.yaml";

/// Index file Brownie keeps next to the deployment artifacts.
const DEPLOYMENT_MAP: &str = "map.json";

/// A Brownie project.
#[derive(Debug, Clone)]
pub struct BrownieProject {
    root: PathBuf,
    deployments_dir: PathBuf,
}

impl BrownieProject {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let deployments_dir = root.join("build").join("deployments");
        Self {
            root,
            deployments_dir,
        }
    }

    /// Whether development-network deployments are persisted, which
    /// requires `dev_deployment_artifacts` in the Brownie config.
    #[must_use]
    pub fn has_dev_deployments(&self) -> bool {
        self.deployments_dir.join("dev").is_dir()
    }

    fn dependency_dirs(&self) -> [PathBuf; 2] {
        let build = self.root.join("build");
        [build.join("contracts"), build.join("interfaces")]
    }
}

impl ArtifactSource for BrownieProject {
    fn watch_root(&self) -> &Path {
        &self.deployments_dir
    }

    fn recursive(&self) -> bool {
        true
    }

    fn accepts(&self, path: &Path) -> bool {
        path.starts_with(&self.deployments_dir)
            && path.extension().is_some_and(|ext| ext == "json")
            && path.file_name().is_some_and(|name| name != DEPLOYMENT_MAP)
    }

    fn parse(&self, path: &Path) -> Result<Vec<ContractArtifact>, ArtifactError> {
        if path.file_name().is_some_and(|name| name == DEPLOYMENT_MAP) {
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
            .pointer("/deployment/address")
            .and_then(Value::as_str)
            .and_then(normalize_address)
        else {
            tracing::debug!(contract = %name, "Artifact has no deployment address");
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
        for dir in self.dependency_dirs() {
            let path = dir.join(format!("{name}.json"));
            match read_json(&path) {
                Ok(json) => return DependencyBundle::from_artifact_json(&json, &path).map(Some),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
