//! Normalized contract artifact types shared by every build tool.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::{hex, keccak256, Address};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ArtifactError;

/// The `{contractName, abi, ast, source}` bundle uploaded for AST decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyBundle {
    pub contract_name: String,
    pub abi: Value,
    pub ast: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DependencyBundle {
    /// Build a bundle from a Truffle/Brownie style artifact, which carries
    /// all four fields at the top level.
    ///
    /// # Errors
    ///
    /// Returns an error if `contractName` is missing.
    pub fn from_artifact_json(json: &Value, path: &Path) -> Result<Self, ArtifactError> {
        let contract_name = json
            .get("contractName")
            .and_then(Value::as_str)
            .ok_or_else(|| ArtifactError::MissingField {
                path: path.to_path_buf(),
                field: "contractName",
            })?;

        Ok(Self {
            contract_name: contract_name.to_string(),
            abi: json.get("abi").cloned().unwrap_or(Value::Null),
            ast: json.get("ast").cloned().unwrap_or(Value::Null),
            source: json.get("source").and_then(Value::as_str).map(String::from),
        })
    }

    /// Serialize to the JSON string form the backend stores.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Dependency name to bundle; `None` when the dependency's file was not found.
pub type Dependencies = BTreeMap<String, Option<DependencyBundle>>;

/// One compiled contract deployed at one address.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractArtifact {
    pub name: String,
    /// Deployed address as written by the build tool, EIP-55 checksummed
    /// when it is a 20-byte hex address.
    pub address: String,
    pub abi: Value,
    pub ast: Value,
    pub source: Option<String>,
    /// keccak256 of the deployed bytecode, when the artifact has it.
    pub hashed_bytecode: Option<String>,
    pub dependencies: Dependencies,
}

impl ContractArtifact {
    /// The contract's own bundle, in the same shape as its dependencies.
    #[must_use]
    pub fn bundle(&self) -> DependencyBundle {
        DependencyBundle {
            contract_name: self.name.clone(),
            abi: self.abi.clone(),
            ast: self.ast.clone(),
            source: self.source.clone(),
        }
    }
}

/// Read and parse a JSON file.
pub(crate) fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ArtifactError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| ArtifactError::json(path, e))
}

/// Checksum a deployed address, passing through values that are not
/// 20-byte hex. Empty values are no address.
pub(crate) fn normalize_address(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(Address::from_str(raw).map_or_else(|_| raw.to_string(), |address| address.to_checksum(None)))
}

/// Hash deployed bytecode given either as a hex string or as a Foundry
/// `{ "object": "0x..." }` container.
///
/// Unlinked bytecode (library placeholders) and empty code hash to `None`.
pub(crate) fn hash_bytecode(value: Option<&Value>) -> Option<String> {
    let code = match value? {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("object")?.as_str()?,
        _ => return None,
    };
    let bytes = hex::decode(code).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(keccak256(bytes).to_string())
}
