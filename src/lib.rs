//! Ethernal CLI - keeps an Ethernal workspace in sync with a local chain
//! and its compiled contract artifacts.

pub mod artifact;
pub mod chain;
pub mod commands;
pub mod config;
pub mod display;
pub mod sync;
pub mod watcher;
