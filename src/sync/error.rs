//! Sync client error types.

/// Errors from backend sync operations.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// No API token is set.
    #[error("[{0}] You need to be authenticated first, run \"ethernal login\"")]
    NotAuthenticated(&'static str),

    /// No workspace has been selected.
    #[error("[{0}] A workspace needs to be set")]
    NoWorkspace(&'static str),

    /// A required request field is absent.
    #[error("[{operation}] Missing parameter: {parameter}")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    /// The user has no workspace at all.
    #[error("You need to create a workspace on the Ethernal dashboard before using the CLI")]
    NoWorkspaces,

    /// Email/password sign-in was rejected.
    #[error("Couldn't login with the specified email/password")]
    InvalidCredentials,

    /// Transport failure.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Backend answer could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
