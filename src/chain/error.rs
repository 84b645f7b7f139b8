//! Node provider error types.

/// JSON-RPC code for an unsupported method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Errors from node provider calls.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    /// Transport failure reaching the node.
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node does not implement the method.
    #[error("Method {0} is not available on this node")]
    MethodNotFound(String),

    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node's answer does not have the expected shape.
    #[error("Unexpected response to {method}: {reason}")]
    Decode { method: String, reason: String },

    /// The RPC server URL is not valid.
    #[error("Invalid RPC server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The RPC server URL uses a transport this agent does not speak.
    #[error("Unsupported RPC transport {0}, use an http(s) endpoint")]
    UnsupportedTransport(String),
}

impl ProviderError {
    #[must_use]
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound(_))
            || matches!(self, Self::Rpc { code, .. } if *code == METHOD_NOT_FOUND)
    }
}
