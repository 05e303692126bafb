//! Command-line argument parsing for the FIFO cache
//!
//! This module defines the CLI structure using clap derive macros, exposing
//! the cache operations (store, fetch, sweep) plus inspection and maintenance
//! commands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use humantime_serde::re::humantime::parse_duration;

/// FIFO Cache - bounded, directory-backed binary cache
#[derive(Parser, Debug)]
#[command(
    name = "fifo_cache",
    version,
    about = "Store and fetch binary payloads in a bounded cache directory",
    long_about = "A directory-backed binary cache with atomic writes and oldest-first eviction.
Entries are named by a hash of their key; once the directory exceeds its byte budget the
oldest entries are deleted until it fits again."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a payload under a key
    Put(PutArgs),

    /// Look up a key and print its path or write its contents
    Get(GetArgs),

    /// Sweep the cache directory down to its byte budget
    Enforce(EnforceArgs),

    /// Show cache size and usage
    Info(InfoArgs),

    /// Remove temporary files abandoned by interrupted writes
    Clean(CleanArgs),

    /// Sweep periodically until interrupted
    Watch(WatchArgs),
}

/// Arguments for the put command
#[derive(Args, Debug, Clone)]
pub struct PutArgs {
    /// Cache key
    pub key: String,

    /// Payload file, or "-" for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub input: PathBuf,

    /// File extension for the entry (defaults to the configured extension)
    #[arg(short, long)]
    pub ext: Option<String>,

    /// Byte budget for the directory (defaults to the configured budget)
    #[arg(short, long, value_name = "BYTES", allow_negative_numbers = true)]
    pub max_bytes: Option<i64>,
}

/// Arguments for the get command
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Cache key
    pub key: String,

    /// File extension for the entry (defaults to the configured extension)
    #[arg(short, long)]
    pub ext: Option<String>,

    /// Copy the entry contents to this file ("-" for stdout) instead of printing its path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the enforce command
#[derive(Args, Debug, Clone)]
pub struct EnforceArgs {
    /// Byte budget for the directory (defaults to the configured budget)
    #[arg(short, long, value_name = "BYTES", allow_negative_numbers = true)]
    pub max_bytes: Option<i64>,
}

/// Arguments for the info command
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the clean command
#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Minimum age of temporary files to remove, e.g. "30m" (defaults to the configured age)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub max_age: Option<Duration>,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Time between sweeps, e.g. "30s" (defaults to the configured interval)
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Byte budget for the directory (defaults to the configured budget)
    #[arg(short, long, value_name = "BYTES", allow_negative_numbers = true)]
    pub max_bytes: Option<i64>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from the global flags, if any were given
    ///
    /// Returns `None` when no verbosity flag is set so the configured level
    /// applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl PutArgs {
    /// Check if the payload comes from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}
