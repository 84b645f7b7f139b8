//! Colored CLI display utilities for sync progress.
//!
//! These lines are the operator's view of the session and are printed
//! regardless of the tracing level.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

/// Plugin that syncs Hardhat projects.
pub const HARDHAT_PLUGIN_URL: &str = "https://github.com/tryethernal/hardhat-ethernal";

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Shorten a hash to `0x1234…abcd` form for display.
#[must_use]
pub fn short_hash(hash: &str) -> String {
    if hash.len() <= 14 || !hash.is_char_boundary(6) || !hash.is_char_boundary(hash.len() - 4) {
        return hash.to_string();
    }
    format!("{}…{}", &hash[..6], &hash[hash.len() - 4..])
}

/// Format the trailing dependency list of a contract sync line.
#[must_use]
pub fn format_dependencies(dependencies: &[&str]) -> String {
    if dependencies.is_empty() {
        String::new()
    } else {
        format!(" Dependencies: {}", dependencies.join(", "))
    }
}

/// Print the authenticated account and workspace.
pub fn print_session(email: Option<&str>, workspace: &str) {
    println!(
        "{} {} Using workspace {} {}",
        timestamp().dimmed(),
        "[SESSION]".blue().bold(),
        workspace.cyan(),
        email.map_or(String::new(), |e| format!("({e})")).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the build tool detected for a directory.
pub fn print_project_detected(kind: &str, dir: &Path) {
    println!(
        "{} {} Detected {} project for {}",
        timestamp().dimmed(),
        "[WATCH]".blue().bold(),
        kind.cyan(),
        dir.display()
    );
    let _ = io::stdout().flush();
}

/// Print the pointer to the Hardhat plugin.
pub fn print_hardhat_notice(dir: &Path) {
    println!(
        "{} {} {} appears to be a Hardhat project, use the plugin to sync it: {}",
        timestamp().dimmed(),
        "[WATCH]".yellow().bold(),
        dir.display(),
        HARDHAT_PLUGIN_URL.underline()
    );
    let _ = io::stdout().flush();
}

/// Print that a directory has no recognized build tool.
pub fn print_unrecognized_project(dir: &Path) {
    println!(
        "{} {} {} is not a Truffle, Brownie or Foundry project, contract metadata won't be uploaded",
        timestamp().dimmed(),
        "[WATCH]".yellow().bold(),
        dir.display()
    );
    let _ = io::stdout().flush();
}

/// Print a successful contract sync.
pub fn print_contract_synced(name: &str, address: &str, dependencies: &[&str]) {
    println!(
        "{} {} Updated artifacts for contract {} ({}).{}",
        timestamp().dimmed(),
        "[CONTRACT]".green().bold(),
        name.bold(),
        address.dimmed(),
        format_dependencies(dependencies)
    );
    let _ = io::stdout().flush();
}

/// Print a synced block.
pub fn print_block_synced(number: u64) {
    println!(
        "{} {} Synced block #{}",
        timestamp().dimmed(),
        "[BLOCK]".green().bold(),
        number
    );
    let _ = io::stdout().flush();
}

/// Print a synced transaction.
pub fn print_transaction_synced(hash: &str) {
    println!(
        "{} {} Synced transaction {}",
        timestamp().dimmed(),
        "[TX]".green().bold(),
        short_hash(hash)
    );
    let _ = io::stdout().flush();
}

/// Print a synced trace.
pub fn print_trace_synced(hash: &str) {
    println!(
        "{} {} Synced trace for tx {}",
        timestamp().dimmed(),
        "[TRACE]".green().bold(),
        short_hash(hash)
    );
    let _ = io::stdout().flush();
}

/// Print that the node cannot produce traces.
pub fn print_trace_unavailable() {
    println!(
        "{} {} debug_traceTransaction is not available on this node",
        timestamp().dimmed(),
        "[TRACE]".yellow().bold()
    );
    let _ = io::stdout().flush();
}

/// Print a connection problem with the node.
pub fn print_connection_error(rpc_server: &str, reason: &str) {
    println!(
        "{} {} Could not connect to {}. {}",
        timestamp().dimmed(),
        "[NODE]".red().bold(),
        rpc_server.cyan(),
        reason.red()
    );
    let _ = io::stdout().flush();
}

/// Print an informational notice.
pub fn print_notice(message: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[NOTICE]".yellow().bold(),
        message
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_long() {
        let hash = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        assert_eq!(short_hash(hash), "0x88df…944b");
    }

    #[test]
    fn test_short_hash_short_input() {
        assert_eq!(short_hash("0xabc"), "0xabc");
    }

    #[test]
    fn test_format_dependencies() {
        assert_eq!(format_dependencies(&[]), "");
        assert_eq!(
            format_dependencies(&["Ownable", "ERC20"]),
            " Dependencies: Ownable, ERC20"
        );
    }
}
