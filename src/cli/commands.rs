//! Command handlers for the FIFO cache CLI
//!
//! This module implements the command handlers that connect CLI arguments to
//! the cache store. Each handler resolves its defaults from the loaded
//! configuration, so flags only need to name what differs.

use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::app::cache::{format_bytes, CacheConfig, CacheStats, CacheStore, SweepOutcome};
use crate::cli::{CleanArgs, EnforceArgs, GetArgs, GlobalArgs, InfoArgs, PutArgs, WatchArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Shared state for one CLI invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Store used by every command
    pub store: CacheStore,
    /// Effective cache configuration after all overrides
    pub config: CacheConfig,
    /// Suppress non-essential output
    pub quiet: bool,
}

impl CommandContext {
    /// Build the context from loaded configuration and global flags
    ///
    /// `--cache-dir` takes precedence over the config file and environment.
    pub fn new(app_config: &AppConfig, global: &GlobalArgs) -> Result<Self> {
        let mut app_config = app_config.clone();
        if let Some(dir) = &global.cache_dir {
            app_config.cache.cache_dir = Some(dir.clone());
        }

        let config = app_config.to_runtime_config()?;
        let store = CacheStore::from_config(&config)?;
        debug!("Using cache directory {}", config.cache_root.display());

        Ok(Self {
            store,
            config,
            quiet: global.quiet,
        })
    }

    /// Cache directory for this invocation
    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_root
    }
}

/// Statistics as printed by `info --json`
#[derive(Debug, Serialize)]
struct InfoReport<'a> {
    #[serde(flatten)]
    stats: &'a CacheStats,
    max_bytes: u64,
    usage_percentage: f64,
}

/// Handle the put command
///
/// Prints the path of the stored entry.
pub async fn handle_put(ctx: &CommandContext, args: PutArgs) -> Result<()> {
    let data = read_input(&args).await?;
    let max_bytes = args.max_bytes.unwrap_or_else(|| ctx.config.budget());

    let path = ctx
        .store
        .put(ctx.cache_dir(), &args.key, &data, max_bytes, args.ext.as_deref())
        .await?;

    info!("Stored {} under key {:?}", format_bytes(data.len() as u64), args.key);
    println!("{}", path.display());
    Ok(())
}

async fn read_input(args: &PutArgs) -> Result<Vec<u8>> {
    if args.reads_stdin() {
        let mut data = Vec::new();
        tokio::io::stdin().read_to_end(&mut data).await?;
        Ok(data)
    } else {
        tokio::fs::read(&args.input).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read input file {}: {}",
                args.input.display(),
                e
            ))
        })
    }
}

/// Handle the get command
///
/// Returns `false` on a miss so the caller can pick the exit code.
pub async fn handle_get(ctx: &CommandContext, args: GetArgs) -> Result<bool> {
    let ext = args.ext.as_deref();

    let Some(output) = args.output else {
        return match ctx.store.get(ctx.cache_dir(), &args.key, ext).await {
            Some(path) => {
                println!("{}", path.display());
                Ok(true)
            }
            None => {
                debug!("No entry for key {:?}", args.key);
                Ok(false)
            }
        };
    };

    let Some(data) = ctx.store.read(ctx.cache_dir(), &args.key, ext).await? else {
        debug!("No entry for key {:?}", args.key);
        return Ok(false);
    };

    write_output(&output, &data).await?;
    Ok(true)
}

async fn write_output(output: &Path, data: &[u8]) -> Result<()> {
    if output.as_os_str() == "-" {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(data).await?;
        stdout.flush().await?;
    } else {
        tokio::fs::write(output, data).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to write output file {}: {}",
                output.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Handle the enforce command
pub async fn handle_enforce(ctx: &CommandContext, args: EnforceArgs) -> Result<()> {
    let max_bytes = args.max_bytes.unwrap_or_else(|| ctx.config.budget());

    match ctx.store.enforce_capacity(ctx.cache_dir(), max_bytes).await? {
        SweepOutcome::Completed(report) => {
            if !ctx.quiet {
                println!("🧹 Capacity Sweep");
                println!("================");
                println!("Location: {}", ctx.cache_dir().display());
                println!("Entries scanned: {}", report.entries_scanned);
                println!("Entries evicted: {}", report.removed_count());
                println!(
                    "Size: {} -> {} (budget {})",
                    format_bytes(report.bytes_before),
                    format_bytes(report.bytes_after),
                    format_bytes(max_bytes.unsigned_abs())
                );
                if report.failed_removals > 0 {
                    println!(
                        "⚠️  Entries that could not be removed: {}",
                        report.failed_removals
                    );
                }
            }
        }
        SweepOutcome::Skipped { holder } => {
            if !ctx.quiet {
                println!(
                    "⏭️  Sweep skipped: another sweep has held the directory since {}",
                    holder.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
    }
    Ok(())
}

/// Handle cache info display
pub async fn handle_info(ctx: &CommandContext, args: InfoArgs) -> Result<()> {
    let stats = ctx.store.stats(ctx.cache_dir()).await;
    let max_bytes = ctx.config.max_bytes;

    if args.json {
        let report = InfoReport {
            stats: &stats,
            max_bytes,
            usage_percentage: stats.usage_percentage(max_bytes),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("💾 Cache Information");
    println!("===================");
    println!("Location: {}", stats.cache_root.display());
    println!("Cached entries: {}", stats.entry_count);
    println!(
        "Cache size: {} of {} ({:.1}%)",
        stats.format_cache_size(),
        format_bytes(max_bytes),
        stats.usage_percentage(max_bytes)
    );
    if stats.reserved_count > 0 {
        println!("Reserved files: {}", stats.reserved_count);
    }
    if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
        println!("Oldest entry: {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Newest entry: {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if stats.is_over_budget(max_bytes) {
        println!("⚠️  Cache is over budget; run 'fifo_cache enforce' to sweep it.");
    }

    Ok(())
}

/// Handle cache cleanup
pub async fn handle_clean(ctx: &CommandContext, args: CleanArgs) -> Result<()> {
    let max_age = args.max_age.unwrap_or(ctx.config.temp_max_age);
    let removed = ctx
        .store
        .clean_temp_files(ctx.cache_dir(), max_age)
        .await?;

    if !ctx.quiet {
        println!("🗑️  Removed {} abandoned temporary files", removed);
    }
    Ok(())
}

/// Handle the watch command
///
/// Runs the background sweeper until Ctrl-C.
pub async fn handle_watch(ctx: &CommandContext, args: WatchArgs) -> Result<()> {
    let interval = args.interval.unwrap_or(ctx.config.sweep_interval);
    let max_bytes = args.max_bytes.unwrap_or_else(|| ctx.config.budget());

    let handle = ctx
        .store
        .spawn_sweeper(ctx.cache_dir().to_path_buf(), max_bytes, interval)?;

    if !ctx.quiet {
        println!(
            "👀 Sweeping {} every {:?} (budget {}). Press Ctrl-C to stop.",
            ctx.cache_dir().display(),
            interval,
            format_bytes(max_bytes.unsigned_abs())
        );
    }

    let result = tokio::signal::ctrl_c().await;
    handle.abort();
    if let Err(e) = result {
        warn!("Failed to listen for Ctrl-C: {}", e);
        return Err(e.into());
    }

    info!("Watch stopped");
    Ok(())
}
