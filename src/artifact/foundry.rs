//! Foundry build output.
//!
//! Deployments are read from `broadcast/**/run-latest.json` transaction logs.
//! Each deployed contract is mapped back to its compiled output through the
//! `solidity-files-cache.json` file, which records the artifact path and the
//! source path of every compiled contract.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::error::ArtifactError;
use super::types::{hash_bytecode, normalize_address, read_json, ContractArtifact, DependencyBundle};
use super::ArtifactSource;

pub const CONFIG_FILE: &str = "foundry.toml";

const CACHE_FILE: &str = "solidity-files-cache.json";
const BROADCAST_LOG: &str = "run-latest.json";

/// Output locations from `[profile.default]` in `foundry.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FoundryLayout {
    pub out: String,
    pub cache_path: String,
    pub broadcast: String,
}

impl Default for FoundryLayout {
    fn default() -> Self {
        Self {
            out: "out".to_string(),
            cache_path: "cache".to_string(),
            broadcast: "broadcast".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FoundryToml {
    #[serde(default)]
    profile: HashMap<String, FoundryLayout>,
}

impl FoundryLayout {
    /// Parse the default profile's layout from `foundry.toml` content.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the file is malformed.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let config: FoundryToml = toml::from_str(content)?;
        Ok(config.profile.get("default").cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct FilesCache {
    #[serde(default)]
    paths: CachePaths,
    #[serde(default)]
    files: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePaths {
    artifacts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CacheEntry {
    #[serde(default, rename = "sourceName")]
    source_name: Option<String>,
    #[serde(default)]
    artifacts: BTreeMap<String, Value>,
}

/// Where a contract's compiled output and source live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLocation {
    pub artifact_path: PathBuf,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BroadcastLog {
    #[serde(default)]
    transactions: Vec<BroadcastTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastTransaction {
    #[serde(default)]
    transaction_type: Option<String>,
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
}

impl BroadcastTransaction {
    fn is_deployment(&self) -> bool {
        matches!(self.transaction_type.as_deref(), Some("CREATE" | "CREATE2"))
    }
}

/// A Foundry project.
#[derive(Debug, Clone)]
pub struct FoundryProject {
    root: PathBuf,
    layout: FoundryLayout,
    broadcast_dir: PathBuf,
}

impl FoundryProject {
    #[must_use]
    pub fn new(root: PathBuf, layout: FoundryLayout) -> Self {
        let broadcast_dir = root.join(&layout.broadcast);
        Self {
            root,
            layout,
            broadcast_dir,
        }
    }

    /// Create a project from its root and `foundry.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if `foundry.toml` exists but is not valid TOML.
    pub fn detect(root: &Path, config_file: &Path) -> Result<Self, ArtifactError> {
        let layout = match std::fs::read_to_string(config_file) {
            Ok(content) => {
                FoundryLayout::from_toml(&content).map_err(|source| ArtifactError::ProjectConfig {
                    path: config_file.to_path_buf(),
                    source,
                })?
            }
            Err(_) => FoundryLayout::default(),
        };
        Ok(Self::new(root.to_path_buf(), layout))
    }

    fn cache_file(&self) -> PathBuf {
        self.root.join(&self.layout.cache_path).join(CACHE_FILE)
    }

    fn load_cache(&self) -> Result<FilesCache, ArtifactError> {
        let cache_path = self.cache_file();
        serde_json::from_value(read_json(&cache_path)?).map_err(|e| ArtifactError::json(&cache_path, e))
    }

    /// Find a contract's compiled output through the files cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be read or parsed.
    pub fn locate(&self, contract_name: &str) -> Result<Option<CompiledLocation>, ArtifactError> {
        Ok(self.locate_in(&self.load_cache()?, contract_name))
    }

    fn locate_in(&self, cache: &FilesCache, contract_name: &str) -> Option<CompiledLocation> {
        let artifacts_dir = self
            .root
            .join(cache.paths.artifacts.as_deref().unwrap_or(&self.layout.out));

        cache.files.iter().find_map(|(file, entry)| {
            let relative = first_artifact_path(entry.artifacts.get(contract_name)?)?;
            let source = entry.source_name.as_deref().unwrap_or(file);
            Some(CompiledLocation {
                artifact_path: artifacts_dir.join(relative),
                source_path: self.root.join(source),
            })
        })
    }

    fn load_compiled(&self, location: &CompiledLocation) -> Result<(Value, Option<String>), ArtifactError> {
        let compiled = read_json(&location.artifact_path)?;
        let source = std::fs::read_to_string(&location.source_path).ok();
        Ok((compiled, source))
    }
}

/// Find the artifact path within a cache entry's per-version map.
///
/// Older caches map `version -> path`; newer ones map
/// `version -> profile -> { path, build_id }`.
fn first_artifact_path(value: &Value) -> Option<&str> {
    match value {
        Value::String(path) => Some(path),
        Value::Object(map) => map
            .get("path")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(first_artifact_path)),
        _ => None,
    }
}

impl ArtifactSource for FoundryProject {
    fn watch_root(&self) -> &Path {
        &self.broadcast_dir
    }

    fn recursive(&self) -> bool {
        true
    }

    fn accepts(&self, path: &Path) -> bool {
        path.starts_with(&self.broadcast_dir) && path.file_name().is_some_and(|name| name == BROADCAST_LOG)
    }

    fn parse(&self, path: &Path) -> Result<Vec<ContractArtifact>, ArtifactError> {
        let log: BroadcastLog =
            serde_json::from_value(read_json(path)?).map_err(|e| ArtifactError::json(path, e))?;

        let deployments: Vec<&BroadcastTransaction> =
            log.transactions.iter().filter(|tx| tx.is_deployment()).collect();
        if deployments.is_empty() {
            return Ok(Vec::new());
        }
        let cache = self.load_cache()?;

        let mut artifacts = Vec::new();
        for tx in deployments {
            let Some(address) = tx.contract_address.as_deref().and_then(normalize_address) else {
                continue;
            };
            let Some(name) = tx.contract_name.as_deref() else {
                tracing::warn!(
                    address = %address,
                    "Broadcast has no contract name for deployment, run the script with -vvv to record it"
                );
                continue;
            };

            let Some(location) = self.locate_in(&cache, name) else {
                tracing::warn!(contract = %name, "Contract not found in solidity-files-cache.json");
                continue;
            };
            let (compiled, source) = match self.load_compiled(&location) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(contract = %name, error = %e, "Skipping deployment without compiled output");
                    continue;
                }
            };

            artifacts.push(ContractArtifact {
                name: name.to_string(),
                address,
                abi: compiled.get("abi").cloned().unwrap_or(Value::Null),
                ast: compiled.get("ast").cloned().unwrap_or(Value::Null),
                source,
                hashed_bytecode: hash_bytecode(compiled.get("deployedBytecode")),
                dependencies: Default::default(),
            });
        }
        Ok(artifacts)
    }

    fn load_dependency(&self, name: &str) -> Result<Option<DependencyBundle>, ArtifactError> {
        let Some(location) = self.locate(name)? else {
            return Ok(None);
        };
        let (compiled, source) = match self.load_compiled(&location) {
            Ok(loaded) => loaded,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(DependencyBundle {
            contract_name: name.to_string(),
            abi: compiled.get("abi").cloned().unwrap_or(Value::Null),
            ast: compiled.get("ast").cloned().unwrap_or(Value::Null),
            source,
        }))
    }
}
