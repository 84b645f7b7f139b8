//! Decoding of `debug_traceTransaction` output into call steps.

use std::collections::HashMap;

use alloy_primitives::{hex, keccak256, Address};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::NodeProvider;

const CALL_OPS: &[&str] = &["CALL", "CALLCODE", "DELEGATECALL", "STATICCALL"];
const CREATE_OPS: &[&str] = &["CREATE", "CREATE2"];

/// Turns a raw opcode trace into the steps uploaded for a transaction.
#[async_trait]
pub trait TraceDecoder: Send + Sync {
    async fn decode(&self, to: Option<&str>, raw_trace: Option<&Value>, provider: &dyn NodeProvider)
        -> Vec<Value>;
}

/// Best-effort decoder that needs no ABI.
///
/// Emits one step per call or create opcode with the target address read
/// from the stack, and annotates each target with the keccak hash of its
/// code.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralTraceDecoder;

/// Address held in the low 20 bytes of a stack word.
fn stack_address(word: &str) -> Option<Address> {
    let digits = word.trim_start_matches("0x");
    let low = digits.get(digits.len().saturating_sub(40)..)?;
    let padded = format!("{low:0>40}");
    let bytes = hex::decode(padded).ok()?;
    Some(Address::from_slice(&bytes))
}

/// Stack word `depth` positions below the top.
fn stack_from_top(log: &Value, depth: usize) -> Option<&str> {
    let stack = log.get("stack")?.as_array()?;
    let index = stack.len().checked_sub(depth + 1)?;
    stack.get(index)?.as_str()
}

/// Extract call and create steps from a geth-style `structLogs` trace.
#[must_use]
pub fn structural_steps(raw_trace: &Value) -> Vec<Value> {
    let Some(logs) = raw_trace.get("structLogs").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut steps = Vec::new();
    for (i, log) in logs.iter().enumerate() {
        let Some(op) = log.get("op").and_then(Value::as_str) else {
            continue;
        };
        let depth = log.get("depth").and_then(Value::as_u64).unwrap_or_default();

        let address = if CALL_OPS.contains(&op) {
            stack_from_top(log, 1).and_then(stack_address)
        } else if CREATE_OPS.contains(&op) {
            // The created address is on top of the stack once execution
            // returns to this depth.
            logs[i + 1..]
                .iter()
                .find(|next| next.get("depth").and_then(Value::as_u64) == Some(depth))
                .and_then(|next| stack_from_top(next, 0))
                .and_then(stack_address)
        } else {
            continue;
        };

        let mut step = json!({
            "op": op,
            "depth": depth,
            "pc": log.get("pc").cloned().unwrap_or(Value::Null),
        });
        if let Some(address) = address {
            step["address"] = json!(address.to_checksum(None));
        }
        steps.push(step);
    }
    steps
}

#[async_trait]
impl TraceDecoder for StructuralTraceDecoder {
    async fn decode(
        &self,
        to: Option<&str>,
        raw_trace: Option<&Value>,
        provider: &dyn NodeProvider,
    ) -> Vec<Value> {
        let Some(raw_trace) = raw_trace else {
            return Vec::new();
        };
        let mut steps = structural_steps(raw_trace);
        tracing::debug!(to = ?to, steps = steps.len(), "Decoded trace");

        let mut code_hashes: HashMap<String, Option<String>> = HashMap::new();
        for step in &mut steps {
            let Some(address) = step.get("address").and_then(Value::as_str).map(String::from) else {
                continue;
            };
            if !code_hashes.contains_key(&address) {
                let hash = match provider.request("eth_getCode", json!([address, "latest"])).await {
                    Ok(code) => code
                        .as_str()
                        .and_then(|c| hex::decode(c).ok())
                        .filter(|bytes| !bytes.is_empty())
                        .map(|bytes| keccak256(bytes).to_string()),
                    Err(e) => {
                        tracing::debug!(address = %address, error = %e, "Could not fetch code");
                        None
                    }
                };
                code_hashes.insert(address.clone(), hash);
            }
            if let Some(Some(hash)) = code_hashes.get(&address) {
                step["contractHashedBytecode"] = json!(hash);
            }
        }
        steps
    }
}
