//! FIFO Cache CLI application
//!
//! Command-line interface for storing, fetching, and sweeping entries in a
//! bounded cache directory.

use std::error::Error as _;
use std::process;

use tracing::{debug, error, Level};
use tracing_subscriber::{fmt, EnvFilter};

use fifo_cache::cli::{
    handle_clean, handle_enforce, handle_get, handle_info, handle_put, handle_watch, Cli,
    CommandContext, Commands,
};
use fifo_cache::config::AppConfig;
use fifo_cache::constants::exit;
use fifo_cache::errors::Result;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!(category = e.category(), "{}", e);
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  Caused by: {}", cause);
                source = cause.source();
            }
            exit::FAILURE
        }
    };

    if code != 0 {
        process::exit(code);
    }
}

/// Main application logic, returning the process exit code
async fn run() -> Result<i32> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Logging comes up before the config error is reported so the failure is logged too
    let app_config = AppConfig::load(cli.global.config.clone()).await;
    let level = cli
        .log_level()
        .or_else(|| {
            app_config
                .as_ref()
                .ok()
                .and_then(|config| config.logging.level.parse().ok())
        })
        .unwrap_or(Level::INFO);
    init_logging(level, cli.global.very_verbose);

    let app_config = app_config?;
    debug!("FIFO Cache v{} starting", env!("CARGO_PKG_VERSION"));

    let ctx = CommandContext::new(&app_config, &cli.global)?;

    match cli.command {
        Commands::Put(args) => {
            debug!("Executing put command");
            handle_put(&ctx, args).await?;
        }
        Commands::Get(args) => {
            debug!("Executing get command");
            if !handle_get(&ctx, args).await? {
                return Ok(exit::MISS);
            }
        }
        Commands::Enforce(args) => {
            debug!("Executing enforce command");
            handle_enforce(&ctx, args).await?;
        }
        Commands::Info(args) => {
            debug!("Executing info command");
            handle_info(&ctx, args).await?;
        }
        Commands::Clean(args) => {
            debug!("Executing clean command");
            handle_clean(&ctx, args).await?;
        }
        Commands::Watch(args) => {
            debug!("Executing watch command");
            handle_watch(&ctx, args).await?;
        }
    }

    Ok(0)
}

/// Initialize logging for the resolved level
///
/// Output goes to stderr so payloads written to stdout stay clean.
fn init_logging(level: Level, very_verbose: bool) {
    let filter = EnvFilter::from_default_env();
    let filter = match format!("fifo_cache={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(very_verbose) // Show levels only in very verbose mode
        .init();

    if very_verbose {
        debug!("Very verbose logging enabled");
    }
}
