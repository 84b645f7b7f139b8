//! Workspace and user records returned by the backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How transaction traces are collected for a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingMode {
    /// Traces are pushed by the Hardhat plugin, not this agent.
    Hardhat,
    /// Traces are collected here through `debug_traceTransaction`.
    Other,
    /// No tracing. Unknown modes land here.
    #[default]
    #[serde(other)]
    Disabled,
}

/// The remote sync target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub name: String,
    pub rpc_server: String,
    #[serde(deserialize_with = "string_or_number")]
    pub network_id: String,
    #[serde(default, rename = "tracing", deserialize_with = "tracing_or_default")]
    pub tracing_mode: TracingMode,
}

impl Workspace {
    /// Whether per-transaction traces are decoded and uploaded.
    #[must_use]
    pub fn traces_enabled(&self) -> bool {
        self.tracing_mode == TracingMode::Other
    }
}

/// The authenticated user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub current_workspace: Option<Workspace>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn tracing_or_default<'de, D>(deserializer: D) -> Result<TracingMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TracingMode>::deserialize(deserializer)?.unwrap_or_default())
}
