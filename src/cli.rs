//! Operator commands for the shared cache.
//!
//! Unlike request handlers, an operator wants to know when the cache is not
//! there, so every command checks reachability first and uses the
//! error-reporting `try_*` accessor calls.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use devhub_cache::invalidate::{self, Mutation};
use devhub_cache::{CacheAccessor, Lookup, NewsMutation, StoreMutation};
use dialoguer::Confirm;
use std::io::Write;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "devhubctl")]
#[command(about = "devhub cache - inspect and invalidate the shared API cache", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the cache store answers
    Ping,
    /// Print the cached JSON payload for a key
    Get {
        /// Cache key, e.g. store:1:12:all:approved
        key: String,
    },
    /// Store a JSON payload under a key
    Set {
        key: String,

        /// JSON value
        value: String,

        /// Time-to-live in seconds (defaults to CACHE_TTL_SECONDS)
        #[arg(short = 't', long)]
        ttl: Option<u64>,
    },
    /// Delete a single key
    Del { key: String },
    /// Delete every key matching a glob pattern
    Clear {
        /// Glob pattern, e.g. store:*
        pattern: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Run the invalidation a write to a resource would trigger
    Invalidate {
        #[arg(value_enum)]
        resource: Resource,

        /// Item id; without it the whole collection is invalidated
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Store,
    News,
}

/// Executes `command` against `cache`, writing human-readable output to `out`.
pub async fn run<W: Write>(command: Commands, cache: &CacheAccessor, out: &mut W) -> Result<()> {
    ensure_reachable(cache).await?;

    match command {
        Commands::Ping => {
            writeln!(out, "PONG ({})", cache.store().backend())?;
        }
        Commands::Get { key } => match cache.lookup::<serde_json::Value>(&key).await {
            Lookup::Hit(value) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            }
            Lookup::Miss => writeln!(out, "(miss)")?,
            Lookup::Failed(e) => {
                return Err::<(), _>(e).with_context(|| format!("failed to read {key}"));
            }
        },
        Commands::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("value must be valid JSON")?;
            let ttl = ttl.map(Duration::from_secs).unwrap_or(cache.default_ttl());

            cache
                .try_set(&key, &value, ttl)
                .await
                .with_context(|| format!("failed to write {key}"))?;
            info!(cache.key = %key, ttl_secs = ttl.as_secs(), "Key written from CLI");
            writeln!(out, "OK")?;
        }
        Commands::Del { key } => {
            let removed = cache
                .try_delete(&key)
                .await
                .with_context(|| format!("failed to delete {key}"))?;
            writeln!(out, "{}", if removed { "Deleted" } else { "Not found" })?;
        }
        Commands::Clear { pattern, yes } => {
            if pattern.trim().is_empty() {
                bail!("pattern must not be empty");
            }
            if !yes && !confirm_clear(&pattern)? {
                writeln!(out, "Aborted")?;
                return Ok(());
            }

            let removed = cache
                .try_clear(&pattern)
                .await
                .with_context(|| format!("failed to clear {pattern}"))?;
            info!(cache.pattern = %pattern, cache.removed = removed, "Pattern cleared from CLI");
            writeln!(out, "Removed {removed} keys matching '{pattern}'")?;
        }
        Commands::Invalidate { resource, id } => {
            let removed = match (resource, id.as_deref()) {
                (Resource::Store, None) => apply(cache, &StoreMutation::Created).await,
                (Resource::Store, Some(id)) => apply(cache, &StoreMutation::Updated { id }).await,
                (Resource::News, None) => apply(cache, &NewsMutation::Created).await,
                (Resource::News, Some(id)) => apply(cache, &NewsMutation::Updated { id }).await,
            };
            writeln!(out, "Removed {removed} keys")?;
        }
    }

    Ok(())
}

async fn apply(cache: &CacheAccessor, mutation: &dyn Mutation) -> u64 {
    info!(?mutation, "Invalidating from CLI");
    invalidate::apply(cache, mutation).await
}

async fn ensure_reachable(cache: &CacheAccessor) -> Result<()> {
    cache
        .ping()
        .await
        .with_context(|| format!("cache store ({}) is unreachable", cache.store().backend()))
}

fn confirm_clear(pattern: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("Delete every key matching '{pattern}'?"))
        .default(false)
        .interact()
        .context("failed to read confirmation")
}
