//! Normalization of chain records before upload.
//!
//! Node records are passed through unchanged except that null-valued
//! entries are dropped and quantity fields are rendered as decimal strings.

use alloy_primitives::U256;
use serde_json::{Map, Value};

const BLOCK_QUANTITIES: &[&str] = &[
    "number",
    "gasLimit",
    "gasUsed",
    "timestamp",
    "difficulty",
    "totalDifficulty",
    "baseFeePerGas",
    "size",
    "blobGasUsed",
    "excessBlobGas",
];

const TRANSACTION_QUANTITIES: &[&str] = &[
    "blockNumber",
    "transactionIndex",
    "nonce",
    "value",
    "gas",
    "gasPrice",
    "maxFeePerGas",
    "maxPriorityFeePerGas",
    "maxFeePerBlobGas",
    "chainId",
    "type",
    "v",
];

const RECEIPT_QUANTITIES: &[&str] = &[
    "blockNumber",
    "transactionIndex",
    "gasUsed",
    "cumulativeGasUsed",
    "effectiveGasPrice",
    "status",
    "type",
    "blobGasUsed",
    "blobGasPrice",
];

const LOG_QUANTITIES: &[&str] = &["blockNumber", "transactionIndex", "logIndex"];

/// Render a node quantity (hex string or JSON number) as a decimal string.
#[must_use]
pub fn quantity_to_decimal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
            if digits.is_empty() {
                return Some("0".to_string());
            }
            U256::from_str_radix(digits, 16).ok().map(|n| n.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a node quantity into a `u64`.
#[must_use]
pub fn quantity_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16).ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Recursively drop object entries whose value is null.
#[must_use]
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn convert_quantities(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(value) = map.get_mut(*field) {
            if let Some(decimal) = quantity_to_decimal(value) {
                *value = Value::String(decimal);
            }
        }
    }
}

fn normalize_with(value: Value, fields: &[&str]) -> Value {
    let mut value = strip_nulls(value);
    if let Value::Object(map) = &mut value {
        convert_quantities(map, fields);
    }
    value
}

/// Normalize a transaction object.
#[must_use]
pub fn normalize_transaction(transaction: Value) -> Value {
    normalize_with(transaction, TRANSACTION_QUANTITIES)
}

/// Normalize a block, including any full transaction objects it embeds.
#[must_use]
pub fn normalize_block(block: Value) -> Value {
    let mut block = normalize_with(block, BLOCK_QUANTITIES);
    if let Some(Value::Array(transactions)) = block.get_mut("transactions") {
        for tx in transactions.iter_mut() {
            if tx.is_object() {
                *tx = normalize_transaction(tx.take());
            }
        }
    }
    block
}

/// Normalize a receipt and its logs.
#[must_use]
pub fn normalize_receipt(receipt: Value) -> Value {
    let mut receipt = normalize_with(receipt, RECEIPT_QUANTITIES);
    if let Some(Value::Array(logs)) = receipt.get_mut("logs") {
        for log in logs.iter_mut() {
            *log = normalize_with(log.take(), LOG_QUANTITIES);
        }
    }
    receipt
}
