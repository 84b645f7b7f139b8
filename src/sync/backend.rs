//! Upload surface of the explorer backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SyncError;
use super::types::Workspace;

/// Contract metadata upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractData {
    pub name: String,
    pub address: String,
    pub abi: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_bytecode: Option<String>,
}

/// Contract AST upload: either the contract's own bundle, or one or more
/// dependency bundles, serialized as JSON strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAst {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Option<String>>,
}

/// Acknowledgement of a block upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAck {
    #[serde(default)]
    pub block_number: Option<u64>,
}

/// Acknowledgement of a transaction upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAck {
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// One call per entity kind. Calls are independent: a failure of one
/// never rolls back another.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The workspace uploads are attributed to.
    fn workspace(&self) -> Option<&Workspace>;

    async fn sync_contract_data(&self, contract: &ContractData) -> Result<(), SyncError>;

    async fn sync_contract_ast(&self, ast: &ContractAst) -> Result<(), SyncError>;

    async fn sync_block(&self, block: &Value, server_sync: bool) -> Result<BlockAck, SyncError>;

    async fn sync_transaction(
        &self,
        block: &Value,
        transaction: &Value,
        receipt: &Value,
    ) -> Result<TransactionAck, SyncError>;

    async fn sync_trace(&self, tx_hash: &str, steps: &[Value]) -> Result<(), SyncError>;

    async fn sync_block_range(&self, from: u64, to: u64) -> Result<(), SyncError>;
}
