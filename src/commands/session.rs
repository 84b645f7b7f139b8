//! Authenticated client bootstrap shared by the commands.

use super::error::CommandError;
use crate::config::{AgentConfig, CredentialStore};
use crate::display;
use crate::sync::SyncClient;

/// Client carrying the stored API token, without a workspace.
///
/// # Errors
///
/// Returns [`CommandError::NotLoggedIn`] if no token is available.
pub fn authenticated_client(
    config: &AgentConfig,
    store: &CredentialStore,
) -> Result<SyncClient, CommandError> {
    let token = store.api_token()?.ok_or(CommandError::NotLoggedIn)?;
    Ok(SyncClient::new(config.api_root.as_str())?.with_api_token(token))
}

/// Authenticate and select the workspace to sync with.
///
/// # Errors
///
/// Returns an error if not logged in, the user has no workspace, or the
/// backend cannot be reached.
pub async fn connect(
    config: &AgentConfig,
    store: &CredentialStore,
    workspace: Option<&str>,
) -> Result<SyncClient, CommandError> {
    let mut client = authenticated_client(config, store)?;
    let selected = client.select_workspace(workspace).await?;
    let email = store.load()?.email;

    tracing::info!(
        workspace = %selected.name,
        rpc_server = %selected.rpc_server,
        network_id = %selected.network_id,
        tracing = ?selected.tracing_mode,
        "Workspace selected"
    );
    display::print_session(email.as_deref(), &selected.name);
    Ok(client)
}
