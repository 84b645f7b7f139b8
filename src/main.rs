//! Ethernal CLI - sync a development chain and its contracts to Ethernal.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ethernal_cli::commands::{self, CommandError, ListenOptions, RangeOptions};
use ethernal_cli::config::{AgentConfig, ConfigLoader, CredentialStore};
use ethernal_cli::display;

#[derive(Parser)]
#[command(
    name = "ethernal",
    about = "Sync a development chain and its contract artifacts to Ethernal",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login to your Ethernal account.
    Login,
    /// Start listening for blocks and contract changes.
    Listen {
        /// Workspace to connect to.
        #[arg(short, long)]
        workspace: Option<String>,
        /// Project directory to watch (repeatable).
        #[arg(short, long = "dir")]
        dir: Vec<PathBuf>,
        /// Only forward block numbers; the backend fetches the data, so the
        /// chain must be reachable from it. Artifacts are not watched.
        #[arg(short, long)]
        server: bool,
        /// Only watch contract artifacts.
        #[arg(short, long)]
        local: bool,
        /// Upload ASTs to decode storage.
        #[arg(short, long)]
        ast_upload: bool,
    },
    /// Sync a block range.
    Sync {
        /// Starting block.
        #[arg(short, long)]
        from: u64,
        /// Ending block (included).
        #[arg(short, long)]
        to: u64,
        /// Sync blocks server side.
        #[arg(short, long)]
        server: bool,
        /// Workspace to connect to.
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Reset a workspace.
    Reset {
        /// Workspace to reset.
        workspace: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AgentConfig, CommandError> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    Ok(loader.load()?.with_env_overrides())
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Shutting down");
        token.cancel();
    });
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    if let Commands::Sync { from, to, .. } = &cli.command {
        commands::validate_range(*from, *to)?;
    }
    let config = load_config(cli.config)?;
    let store = CredentialStore::new()?;
    tracing::debug!(api_root = %config.api_root, "Configuration loaded");

    match cli.command {
        Commands::Login => commands::login(&config, &store).await,
        Commands::Listen {
            workspace,
            dir,
            server,
            local,
            ast_upload,
        } => {
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let options = ListenOptions {
                workspace,
                directories: dir,
                server,
                local,
                ast_upload,
            };
            commands::listen(&config, &store, options, cancel).await
        }
        Commands::Sync {
            from,
            to,
            server,
            workspace,
        } => {
            let options = RangeOptions {
                from,
                to,
                server,
                workspace,
            };
            commands::sync_range(&config, &store, options).await.map(|_| ())
        }
        Commands::Reset { workspace } => commands::reset(&config, &store, &workspace).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
