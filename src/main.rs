//! Folio - portfolio content tools
//!
//! Renders Markdown and fetches the site's JSON data files through a
//! persistent TTL cache.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::cli::{execute, Cli};
use folio::Config;

/// Main entry point for the folio command line.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Parse command-line arguments
/// 3. Load configuration from environment variables
/// 4. Execute the subcommand and print its output on stdout
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    debug!(
        "Configuration loaded: prefix={}, default_ttl={}s, store={:?}, quota={}",
        config.cache_prefix, config.default_ttl, config.store_path, config.store_quota
    );

    let output = execute(cli.command, &config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
