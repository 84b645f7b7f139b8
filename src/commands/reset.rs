//! `reset`: delete all synced data of a workspace.

use super::error::CommandError;
use super::session::authenticated_client;
use crate::config::{AgentConfig, CredentialStore};
use crate::display;

/// Reset the named workspace.
///
/// # Errors
///
/// Returns an error if not logged in or the backend rejects the request.
pub async fn reset(
    config: &AgentConfig,
    store: &CredentialStore,
    workspace: &str,
) -> Result<(), CommandError> {
    let client = authenticated_client(config, store)?;
    display::print_notice(&format!("Resetting workspace \"{workspace}\"..."));
    client.reset_workspace(workspace).await?;
    display::print_notice(&format!("Workspace \"{workspace}\" has been reset!"));
    Ok(())
}
