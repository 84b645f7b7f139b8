//! `login`: exchange email and password for a stored API token.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::error::CommandError;
use crate::config::{AgentConfig, CredentialStore, Credentials};
use crate::display;
use crate::sync::SyncClient;

/// Prompt on stdout and read one trimmed line from `input`.
async fn prompt<R>(input: &mut R, label: &str) -> Result<String, CommandError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{label}: ").as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Ask for credentials on the terminal, then log in.
///
/// # Errors
///
/// Returns an error if the input is empty, sign-in fails or the token
/// cannot be saved.
pub async fn login(config: &AgentConfig, store: &CredentialStore) -> Result<(), CommandError> {
    let mut input = BufReader::new(tokio::io::stdin());
    let email = prompt(&mut input, "Email").await?;
    if email.is_empty() {
        return Err(CommandError::EmptyInput("Email"));
    }
    let password = prompt(&mut input, "Password").await?;
    if password.is_empty() {
        return Err(CommandError::EmptyInput("Password"));
    }
    login_with(config, store, &email, &password).await
}

/// Sign in and persist the returned API token.
///
/// # Errors
///
/// Returns an error if sign-in fails or the token cannot be saved.
pub async fn login_with(
    config: &AgentConfig,
    store: &CredentialStore,
    email: &str,
    password: &str,
) -> Result<(), CommandError> {
    let client = SyncClient::new(config.api_root.as_str())?;
    let api_token = client.sign_in(email, password).await?;

    store.save(&Credentials {
        email: Some(email.to_string()),
        api_token: Some(api_token),
    })?;
    tracing::info!(email = %email, path = %store.path().display(), "Credentials saved");
    display::print_notice(&format!("Logged in as {email}"));
    Ok(())
}
