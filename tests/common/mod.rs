//! Shared fakes and fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use ethernal_cli::chain::{NodeProvider, ProviderError};
use ethernal_cli::sync::{
    Backend, BlockAck, ContractAst, ContractData, SessionOptions, SyncError, SyncSession,
    TracingMode, TransactionAck, Workspace,
};

pub fn workspace(tracing_mode: TracingMode) -> Workspace {
    Workspace {
        name: "Hardhat".to_string(),
        rpc_server: "http://127.0.0.1:8545".to_string(),
        network_id: "5".to_string(),
        tracing_mode,
    }
}

/// Backend that records every call and always succeeds.
#[derive(Debug)]
pub struct RecordingBackend {
    workspace: Workspace,
    pub contracts: Mutex<Vec<ContractData>>,
    pub asts: Mutex<Vec<ContractAst>>,
    pub blocks: Mutex<Vec<(Value, bool)>>,
    pub transactions: Mutex<Vec<String>>,
    pub traces: Mutex<Vec<(String, Vec<Value>)>>,
    pub ranges: Mutex<Vec<(u64, u64)>>,
}

impl RecordingBackend {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            contracts: Mutex::default(),
            asts: Mutex::default(),
            blocks: Mutex::default(),
            transactions: Mutex::default(),
            traces: Mutex::default(),
            ranges: Mutex::default(),
        }
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.lock().unwrap().len()
    }

    pub fn transaction_hashes(&self) -> Vec<String> {
        let mut hashes = self.transactions.lock().unwrap().clone();
        hashes.sort();
        hashes
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn workspace(&self) -> Option<&Workspace> {
        Some(&self.workspace)
    }

    async fn sync_contract_data(&self, contract: &ContractData) -> Result<(), SyncError> {
        self.contracts.lock().unwrap().push(contract.clone());
        Ok(())
    }

    async fn sync_contract_ast(&self, ast: &ContractAst) -> Result<(), SyncError> {
        self.asts.lock().unwrap().push(ast.clone());
        Ok(())
    }

    async fn sync_block(&self, block: &Value, server_sync: bool) -> Result<BlockAck, SyncError> {
        self.blocks.lock().unwrap().push((block.clone(), server_sync));
        Ok(BlockAck {
            block_number: block.get("number").and_then(Value::as_u64),
        })
    }

    async fn sync_transaction(
        &self,
        _block: &Value,
        transaction: &Value,
        _receipt: &Value,
    ) -> Result<TransactionAck, SyncError> {
        let hash = transaction["hash"].as_str().unwrap_or_default().to_string();
        self.transactions.lock().unwrap().push(hash.clone());
        Ok(TransactionAck { tx_hash: Some(hash) })
    }

    async fn sync_trace(&self, tx_hash: &str, steps: &[Value]) -> Result<(), SyncError> {
        self.traces
            .lock()
            .unwrap()
            .push((tx_hash.to_string(), steps.to_vec()));
        Ok(())
    }

    async fn sync_block_range(&self, from: u64, to: u64) -> Result<(), SyncError> {
        self.ranges.lock().unwrap().push((from, to));
        Ok(())
    }
}

/// Backend that rejects the selected entity kinds and records the rest.
#[derive(Debug)]
pub struct FailingBackend {
    pub inner: RecordingBackend,
    pub fail_contracts: bool,
    pub fail_asts: bool,
    pub fail_blocks: bool,
    /// Every call, accepted or not.
    pub attempts: Mutex<Vec<&'static str>>,
}

impl FailingBackend {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            inner: RecordingBackend::new(workspace),
            fail_contracts: false,
            fail_asts: false,
            fail_blocks: false,
            attempts: Mutex::default(),
        }
    }

    pub fn attempts(&self, kind: &str) -> usize {
        self.attempts.lock().unwrap().iter().filter(|k| **k == kind).count()
    }

    fn attempt(&self, kind: &'static str, fail: bool) -> Result<(), SyncError> {
        self.attempts.lock().unwrap().push(kind);
        if fail {
            return Err(SyncError::Http {
                status: 500,
                body: format!("{kind} rejected"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FailingBackend {
    fn workspace(&self) -> Option<&Workspace> {
        self.inner.workspace()
    }

    async fn sync_contract_data(&self, contract: &ContractData) -> Result<(), SyncError> {
        self.attempt("contract", self.fail_contracts)?;
        self.inner.sync_contract_data(contract).await
    }

    async fn sync_contract_ast(&self, ast: &ContractAst) -> Result<(), SyncError> {
        self.attempt("ast", self.fail_asts)?;
        self.inner.sync_contract_ast(ast).await
    }

    async fn sync_block(&self, block: &Value, server_sync: bool) -> Result<BlockAck, SyncError> {
        self.attempt("block", self.fail_blocks)?;
        self.inner.sync_block(block, server_sync).await
    }

    async fn sync_transaction(
        &self,
        block: &Value,
        transaction: &Value,
        receipt: &Value,
    ) -> Result<TransactionAck, SyncError> {
        self.attempt("transaction", false)?;
        self.inner.sync_transaction(block, transaction, receipt).await
    }

    async fn sync_trace(&self, tx_hash: &str, steps: &[Value]) -> Result<(), SyncError> {
        self.attempt("trace", false)?;
        self.inner.sync_trace(tx_hash, steps).await
    }

    async fn sync_block_range(&self, from: u64, to: u64) -> Result<(), SyncError> {
        self.attempt("range", false)?;
        self.inner.sync_block_range(from, to).await
    }
}

pub fn session(backend: &Arc<RecordingBackend>, ast_upload: bool) -> Arc<SyncSession> {
    session_with(Arc::clone(backend) as Arc<dyn Backend>, ast_upload)
}

pub fn session_with(backend: Arc<dyn Backend>, ast_upload: bool) -> Arc<SyncSession> {
    Arc::new(SyncSession::new(backend, SessionOptions { ast_upload }).unwrap())
}

pub fn tx_hash(n: u64) -> String {
    format!("0x{n:064x}")
}

/// In-memory node: blocks by number, one receipt per transaction.
#[derive(Debug, Default)]
pub struct FakeProvider {
    pub head: Mutex<u64>,
    pub blocks: HashMap<u64, Value>,
    /// Transactions whose receipt calls fail, structured and raw alike.
    pub failing_receipts: HashSet<String>,
    /// Answer `debug_traceTransaction` with method-not-found.
    pub no_debug_api: bool,
    /// Number of upcoming `eth_blockNumber` calls that fail.
    pub head_failures: Mutex<u32>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// A chain whose block `n` holds the given transaction hashes.
    pub fn with_block(number: u64, hashes: &[String]) -> Self {
        let transactions: Vec<Value> = hashes
            .iter()
            .map(|hash| {
                json!({
                    "hash": hash,
                    "blockNumber": format!("0x{number:x}"),
                    "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                    "value": "0xde0b6b3a7640000",
                    "gas": "0x5208",
                    "gasPrice": "0x3b9aca00",
                    "nonce": "0x1",
                    "chainId": null,
                })
            })
            .collect();
        let block = json!({
            "number": format!("0x{number:x}"),
            "hash": tx_hash(1000 + number),
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x5208",
            "timestamp": "0x65000000",
            "baseFeePerGas": null,
            "transactions": transactions,
        });
        Self {
            head: Mutex::new(number),
            blocks: HashMap::from([(number, block)]),
            ..Self::default()
        }
    }

    fn receipt(&self, hash: &str) -> Result<Option<Value>, ProviderError> {
        if self.failing_receipts.contains(hash) {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "receipt unavailable".to_string(),
            });
        }
        Ok(Some(json!({
            "transactionHash": hash,
            "blockNumber": "0x1",
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "status": "0x1",
            "contractAddress": null,
            "logs": [],
        })))
    }

    /// Add block `n` holding the given transaction hashes.
    pub fn add_block(&mut self, number: u64, hashes: &[String]) {
        self.blocks.extend(Self::with_block(number, hashes).blocks);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }
}

#[async_trait]
impl NodeProvider for FakeProvider {
    async fn block_number(&self) -> Result<u64, ProviderError> {
        self.calls.lock().unwrap().push("eth_blockNumber".to_string());
        let mut failures = self.head_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ProviderError::Rpc {
                code: -32603,
                message: "node unreachable".to_string(),
            });
        }
        Ok(*self.head.lock().unwrap())
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<Value>, ProviderError> {
        self.calls.lock().unwrap().push("eth_getBlockByNumber".to_string());
        Ok(self.blocks.get(&number).cloned())
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, ProviderError> {
        self.calls.lock().unwrap().push("receipt".to_string());
        self.receipt(hash)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        match method {
            "eth_getTransactionReceipt" => {
                let hash = params[0].as_str().unwrap_or_default();
                Ok(self.receipt(hash)?.unwrap_or(Value::Null))
            }
            "debug_traceTransaction" if self.no_debug_api => {
                Err(ProviderError::MethodNotFound(method.to_string()))
            }
            "debug_traceTransaction" => Ok(json!({
                "gas": 21000,
                "structLogs": [
                    {"pc": 10, "op": "CALL", "depth": 1, "stack": [
                        "0x0", "0x0", "0x0", "0x0", "0x0",
                        "0x000000000000000000000000e7f1725e7734ce288f8367e1bb143e90bb3f0512",
                        "0x5208"
                    ]},
                    {"pc": 0, "op": "STOP", "depth": 2, "stack": []}
                ]
            })),
            "eth_getCode" => Ok(json!("0x6080")),
            other => Err(ProviderError::MethodNotFound(other.to_string())),
        }
    }
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// A Truffle artifact for `name` deployed at `address` on network 5.
pub fn truffle_artifact(name: &str, address: &str, exported: &[&str]) -> Value {
    let symbols: serde_json::Map<String, Value> = exported
        .iter()
        .enumerate()
        .map(|(i, symbol)| ((*symbol).to_string(), json!([i + 1])))
        .collect();
    json!({
        "contractName": name,
        "abi": [{"type": "function", "name": "value", "inputs": [], "outputs": []}],
        "ast": {"nodeType": "SourceUnit", "exportedSymbols": symbols},
        "source": format!("contract {name} {{}}"),
        "deployedBytecode": "0x6080604052",
        "networks": {"5": {"address": address}},
    })
}
