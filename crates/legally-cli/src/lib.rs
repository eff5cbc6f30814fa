//! Legally CLI
//!
//! The `legally` binary: loads `legally.toml`, installs logging and runs
//! one subcommand against the content pipeline and the backend client.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use commands::App;
pub use config::AppConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
