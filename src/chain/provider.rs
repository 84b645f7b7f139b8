//! Node access over HTTP JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use super::error::{ProviderError, METHOD_NOT_FOUND};
use crate::sync::records::quantity_to_u64;

/// Timeout for a single RPC call.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// The node calls the chain feed needs.
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// Block with full transaction objects, `None` if unknown.
    async fn block_with_transactions(&self, number: u64) -> Result<Option<Value>, ProviderError>;

    /// Receipt of a mined transaction, `None` if not yet available.
    ///
    /// Fails with [`ProviderError::Decode`] when the node's receipt does not
    /// have the standard shape; callers can then fall back to
    /// [`request`](Self::request).
    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, ProviderError>;

    /// Raw method invocation.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// Fields every standard receipt carries.
const RECEIPT_FIELDS: [&str; 3] = ["transactionHash", "blockNumber", "cumulativeGasUsed"];

/// JSON-RPC provider for an `http://` or `https://` node.
#[derive(Debug)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpProvider {
    /// Create a provider for the given RPC server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or not http(s).
    pub fn new(rpc_server: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(rpc_server)?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ProviderError::UnsupportedTransport(other.to_string())),
        }
        let client = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl NodeProvider for HttpProvider {
    async fn block_number(&self) -> Result<u64, ProviderError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        quantity_to_u64(&result).ok_or_else(|| ProviderError::Decode {
            method: "eth_blockNumber".to_string(),
            reason: format!("not a quantity: {result}"),
        })
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<Value>, ProviderError> {
        let result = self
            .request("eth_getBlockByNumber", json!([format!("0x{number:x}"), true]))
            .await?;
        Ok((!result.is_null()).then_some(result))
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, ProviderError> {
        let result = self.request("eth_getTransactionReceipt", json!([hash])).await?;
        if result.is_null() {
            return Ok(None);
        }
        if let Some(missing) = RECEIPT_FIELDS.iter().find(|field| result.get(**field).is_none()) {
            return Err(ProviderError::Decode {
                method: "eth_getTransactionReceipt".to_string(),
                reason: format!("missing field `{missing}`"),
            });
        }
        Ok(Some(result))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "RPC request");
        let response: Value = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if code == METHOD_NOT_FOUND {
                return Err(ProviderError::MethodNotFound(method.to_string()));
            }
            return Err(ProviderError::Rpc { code, message });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| ProviderError::Decode {
                method: method.to_string(),
                reason: "missing result".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_rejects_websocket_urls() {
        let err = HttpProvider::new("ws://127.0.0.1:8545").unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedTransport(s) if s == "ws"));
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(matches!(
            HttpProvider::new("not a url").unwrap_err(),
            ProviderError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn test_block_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x1b4"
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri()).unwrap();
        assert_eq!(provider.block_number().await.unwrap(), 436);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32601, "message": "Method not found"}
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri()).unwrap();
        let err = provider
            .request("debug_traceTransaction", json!(["0xabc", {}]))
            .await
            .unwrap_err();
        assert!(err.is_method_not_found());
    }

    #[tokio::test]
    async fn test_nonstandard_receipt_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": {"transactionHash": "0xabc"}
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri()).unwrap();
        let err = provider.transaction_receipt("0xabc").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));

        let raw = provider
            .request("eth_getTransactionReceipt", json!(["0xabc"]))
            .await
            .unwrap();
        assert_eq!(raw["transactionHash"], "0xabc");
    }

    #[tokio::test]
    async fn test_missing_block_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": null
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri()).unwrap();
        assert!(provider.block_with_transactions(99).await.unwrap().is_none());
    }
}
