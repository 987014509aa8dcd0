// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `fetchdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fetchdag",
    version,
    about = "Scrape-driven exporter that fans out to chain REST endpoints via a task DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Fetchdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Fetchdag.toml")]
    pub config: String,

    /// Override the listen address from the config (e.g. `127.0.0.1:9560`).
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FETCHDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print the task graph, but don't serve.
    #[arg(long)]
    pub check: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
