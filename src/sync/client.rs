//! HTTP client for the explorer backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::backend::{Backend, BlockAck, ContractAst, ContractData, TransactionAck};
use super::error::SyncError;
use super::types::{User, Workspace};

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout; AST bundles of large projects are slow to upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn build_http_client() -> Result<Client, SyncError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(SyncError::Request)
}

/// Authenticated session against the backend.
///
/// Every upload checks for an API token and a selected workspace before
/// any request is sent.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: Client,
    api_root: String,
    api_token: Option<String>,
    workspace: Option<Workspace>,
}

impl SyncClient {
    /// Create an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_root: impl Into<String>) -> Result<Self, SyncError> {
        Ok(Self {
            client: build_http_client()?,
            api_root: api_root.into().trim_end_matches('/').to_string(),
            api_token: None,
            workspace: None,
        })
    }

    /// Set the API token used for every request.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Use a known workspace without asking the backend.
    #[must_use]
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api_token.is_some()
    }

    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Exchange email and password for an API token.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidCredentials`] if the backend does not
    /// return a token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, SyncError> {
        let response = self
            .client
            .post(self.url("/api/users/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = Self::read_response(response).await.map_err(|e| {
            tracing::debug!(error = %e, "Sign-in rejected");
            SyncError::InvalidCredentials
        })?;

        body.pointer("/user/apiToken")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or(SyncError::InvalidCredentials)
    }

    /// Fetch the authenticated user and their workspaces.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    pub async fn fetch_user(&self) -> Result<User, SyncError> {
        let token = self.token("fetchUser")?;
        let response = self
            .client
            .get(self.url("/api/users/me"))
            .bearer_auth(token)
            .send()
            .await?;
        let body = Self::read_response(response).await?;
        serde_json::from_value(body).map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Select the workspace uploads go to.
    ///
    /// A requested name that the user does not have falls back to their
    /// current workspace with a warning. A user without a current workspace
    /// gets their first one, which is also saved as current.
    ///
    /// # Errors
    ///
    /// Returns an error if the user has no workspace or a request fails.
    pub async fn select_workspace(&mut self, requested: Option<&str>) -> Result<Workspace, SyncError> {
        let user = self.fetch_user().await?;
        if user.workspaces.is_empty() {
            return Err(SyncError::NoWorkspaces);
        }

        let selected = match requested {
            Some(name) => {
                if let Some(found) = user.workspaces.iter().find(|ws| ws.name == name) {
                    found.clone()
                } else {
                    let fallback = self.default_workspace(&user).await?;
                    tracing::warn!(
                        requested = %name,
                        workspace = %fallback.name,
                        "Could not find workspace, using the default one"
                    );
                    fallback
                }
            }
            None => self.default_workspace(&user).await?,
        };

        self.workspace = Some(selected.clone());
        Ok(selected)
    }

    async fn default_workspace(&self, user: &User) -> Result<Workspace, SyncError> {
        if let Some(current) = &user.current_workspace {
            return Ok(current.clone());
        }
        let first = user.workspaces.first().cloned().ok_or(SyncError::NoWorkspaces)?;
        let token = self.token("setCurrentWorkspace")?;
        self.post(
            token,
            "/api/users/me/setCurrentWorkspace",
            json!({ "workspace": first.name }),
        )
        .await?;
        Ok(first)
    }

    /// Delete all synced data of a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is set or the request fails.
    pub async fn reset_workspace(&self, name: &str) -> Result<(), SyncError> {
        if name.is_empty() {
            return Err(SyncError::MissingParameter {
                operation: "resetWorkspace",
                parameter: "workspace",
            });
        }
        let token = self.token("resetWorkspace")?;
        self.post(token, "/api/workspaces/reset", json!({ "workspace": name }))
            .await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_root)
    }

    fn token(&self, operation: &'static str) -> Result<&str, SyncError> {
        self.api_token
            .as_deref()
            .ok_or(SyncError::NotAuthenticated(operation))
    }

    fn session(&self, operation: &'static str) -> Result<(&str, &Workspace), SyncError> {
        let token = self.token(operation)?;
        let workspace = self
            .workspace
            .as_ref()
            .ok_or(SyncError::NoWorkspace(operation))?;
        Ok((token, workspace))
    }

    async fn post(&self, token: &str, path: &str, data: Value) -> Result<Value, SyncError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&json!({ "data": data }))
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<Value, SyncError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SyncError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Backend for SyncClient {
    fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    async fn sync_contract_data(&self, contract: &ContractData) -> Result<(), SyncError> {
        if contract.name.is_empty() || contract.address.is_empty() {
            return Err(SyncError::MissingParameter {
                operation: "syncContractData",
                parameter: "name/address",
            });
        }
        let (token, workspace) = self.session("syncContractData")?;

        let mut data = serde_json::to_value(contract).map_err(|e| SyncError::Parse(e.to_string()))?;
        data["workspace"] = json!(workspace.name);
        self.post(token, &format!("/api/contracts/{}", contract.address), data)
            .await?;
        Ok(())
    }

    async fn sync_contract_ast(&self, ast: &ContractAst) -> Result<(), SyncError> {
        if ast.address.is_empty() || (ast.ast.is_none() && ast.dependencies.is_empty()) {
            return Err(SyncError::MissingParameter {
                operation: "syncContractAst",
                parameter: "address/ast",
            });
        }
        let (token, workspace) = self.session("syncContractAst")?;

        let mut data = serde_json::to_value(ast).map_err(|e| SyncError::Parse(e.to_string()))?;
        data["workspace"] = json!(workspace.name);
        self.post(token, &format!("/api/contracts/{}", ast.address), data)
            .await?;
        Ok(())
    }

    async fn sync_block(&self, block: &Value, server_sync: bool) -> Result<BlockAck, SyncError> {
        if block.is_null() {
            return Err(SyncError::MissingParameter {
                operation: "syncBlock",
                parameter: "block",
            });
        }
        let (token, workspace) = self.session("syncBlock")?;

        let body = self
            .post(
                token,
                &format!("/api/blocks?serverSync={server_sync}"),
                json!({ "block": block, "workspace": workspace.name }),
            )
            .await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn sync_transaction(
        &self,
        block: &Value,
        transaction: &Value,
        receipt: &Value,
    ) -> Result<TransactionAck, SyncError> {
        if block.is_null() || transaction.is_null() || receipt.is_null() {
            return Err(SyncError::MissingParameter {
                operation: "syncTransaction",
                parameter: "block/transaction/receipt",
            });
        }
        let (token, workspace) = self.session("syncTransaction")?;

        let body = self
            .post(
                token,
                "/api/transactions",
                json!({
                    "block": block,
                    "transaction": transaction,
                    "transactionReceipt": receipt,
                    "workspace": workspace.name,
                }),
            )
            .await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn sync_trace(&self, tx_hash: &str, steps: &[Value]) -> Result<(), SyncError> {
        if tx_hash.is_empty() {
            return Err(SyncError::MissingParameter {
                operation: "syncTrace",
                parameter: "txHash",
            });
        }
        let (token, workspace) = self.session("syncTrace")?;

        self.post(
            token,
            &format!("/api/transactions/{tx_hash}/trace"),
            json!({ "txHash": tx_hash, "steps": steps, "workspace": workspace.name }),
        )
        .await?;
        Ok(())
    }

    async fn sync_block_range(&self, from: u64, to: u64) -> Result<(), SyncError> {
        let (token, workspace) = self.session("syncBlockRange")?;

        self.post(
            token,
            "/api/blocks/syncRange",
            json!({ "workspace": workspace.name, "from": from, "to": to }),
        )
        .await?;
        Ok(())
    }
}
