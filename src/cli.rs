//! Command-line interface for folio
//!
//! Parses arguments with clap and executes each subcommand against the
//! renderer, the fetcher and the file-backed cache. Commands return their
//! output as a string; printing is left to the binary.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::config::Config;
use crate::content::{load_blogs, BlogPost};
use crate::fetch::{ContentFetcher, FetchOptions};
use crate::markdown::MarkdownRenderer;
use crate::storage::FileStore;

/// Folio - render portfolio Markdown and manage the content cache
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Portfolio content tools: Markdown rendering and cached JSON fetching")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Render a Markdown file to HTML (reads stdin when FILE is omitted)
    Render { file: Option<PathBuf> },

    /// Fetch a JSON document through the cache and pretty-print it
    Fetch {
        url: String,
        /// Seconds to keep the response cached (default: FOLIO_CACHE_TTL)
        #[arg(long)]
        ttl: Option<u64>,
        /// Bypass the cache for both reading and writing
        #[arg(long)]
        no_cache: bool,
    },

    /// Load, validate and list the posts of a blog data file
    Blogs {
        url: String,
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Inspect or maintain the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CacheAction {
    /// Show item counts and size of the cache namespace
    Stats,
    /// Remove expired and corrupted entries
    Clean,
    /// Remove every entry of the cache namespace
    Clear,
    /// Print the cached value for KEY
    Get { key: String },
    /// Remove the cached value for KEY
    Remove { key: String },
}

// == Cache Setup ==
/// Opens the TTL cache over the configured file store.
///
/// # Errors
/// Fails when no store location is known or the store file cannot be read.
pub fn open_cache(config: &Config) -> anyhow::Result<TtlCache> {
    let Some(path) = config.store_path.as_ref() else {
        bail!("No cache directory available; set FOLIO_STORE_PATH");
    };

    let store = FileStore::open(path)
        .with_context(|| format!("Failed to open cache store at {}", path.display()))?
        .with_quota(config.store_quota);
    debug!(path = %store.path().display(), "Using cache store");

    Ok(TtlCache::new(Arc::new(store), config.cache_config()))
}

// == Execution ==
/// Executes `command` with a cache opened from `config`.
///
/// Fetch commands degrade to uncached fetching when the store cannot be
/// opened; cache commands fail instead.
pub async fn execute(command: Command, config: &Config) -> anyhow::Result<String> {
    let needs_store = matches!(
        command,
        Command::Cache { .. } | Command::Fetch { .. } | Command::Blogs { .. }
    );

    let cache = if needs_store {
        match open_cache(config) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) if !matches!(command, Command::Cache { .. }) => {
                warn!(error = %e, "Continuing without cache");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    execute_with(command, cache, config.default_ttl).await
}

/// Executes `command` against an already constructed cache.
///
/// # Arguments
/// * `command` - Parsed subcommand
/// * `cache` - Cache for fetch and cache commands; required by the latter
/// * `default_ttl` - TTL in seconds when `--ttl` is not given
///
/// # Returns
/// The text to print on stdout.
pub async fn execute_with(
    command: Command,
    cache: Option<Arc<TtlCache>>,
    default_ttl: u64,
) -> anyhow::Result<String> {
    match command {
        Command::Render { file } => render_markdown(file),
        Command::Fetch { url, ttl, no_cache } => {
            let options = FetchOptions {
                use_cache: !no_cache,
                ttl: ttl.unwrap_or(default_ttl),
            };
            let fetcher = ContentFetcher::new(reqwest::Client::new(), cache);
            let value: Value = fetcher.fetch_json(&url, options).await?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        Command::Blogs { url, ttl } => {
            let fetcher = ContentFetcher::new(reqwest::Client::new(), cache);
            let posts = load_blogs(
                &fetcher,
                &url,
                FetchOptions::with_ttl(ttl.unwrap_or(default_ttl)),
            )
            .await?;
            info!(count = posts.len(), "Loaded blog posts");
            Ok(format_posts(&posts))
        }
        Command::Cache { action } => {
            let Some(cache) = cache else {
                bail!("Cache is not available");
            };
            run_cache_action(&cache, action)
        }
    }
}

fn render_markdown(file: Option<PathBuf>) -> anyhow::Result<String> {
    let source = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    Ok(MarkdownRenderer::new().render(source.as_str()))
}

fn run_cache_action(cache: &TtlCache, action: CacheAction) -> anyhow::Result<String> {
    if !cache.is_available() {
        bail!("Cache store is unavailable");
    }

    match action {
        CacheAction::Stats => Ok(format_stats(&cache.get_stats())),
        CacheAction::Clean => {
            let removed = cache.clean_expired();
            Ok(format!("Removed {} expired entries", removed))
        }
        CacheAction::Clear => {
            if !cache.clear() {
                bail!("Failed to clear cache '{}'", cache.prefix());
            }
            Ok(format!("Cleared cache '{}'", cache.prefix()))
        }
        CacheAction::Get { key } => match cache.get::<Value>(&key) {
            Some(value) => Ok(serde_json::to_string_pretty(&value)?),
            None => bail!("No cached value for '{}'", key),
        },
        CacheAction::Remove { key } => {
            if !cache.remove(&key) {
                bail!("Failed to remove '{}'", key);
            }
            Ok(format!("Removed '{}'", key))
        }
    }
}

// == Formatting ==
fn format_stats(stats: &CacheStats) -> String {
    format!(
        "prefix: {}\navailable: {}\nitems: {}\nexpired: {}\nsize: {} KB\nreads: {} hits, {} misses ({:.1}% hit rate)",
        stats.prefix,
        stats.available,
        stats.total_items,
        stats.expired_items,
        stats.total_size_kb(),
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    )
}

fn format_posts(posts: &[BlogPost]) -> String {
    posts
        .iter()
        .map(|post| {
            let id = match &post.id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}\t{}\t{}", id, post.date, post.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
