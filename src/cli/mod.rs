//! Command-line interface components
//!
//! This module contains CLI-specific code for the FIFO cache application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    CleanArgs, Cli, Commands, EnforceArgs, GetArgs, GlobalArgs, InfoArgs, PutArgs, WatchArgs,
};
pub use commands::{
    handle_clean, handle_enforce, handle_get, handle_info, handle_put, handle_watch,
    CommandContext,
};
