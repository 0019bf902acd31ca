//! Video uploader entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Uploads video files through the multipart control plane.
#[derive(Parser, Debug)]
#[command(author, version, about = "Multipart video uploader")]
struct Args {
    /// Video files to upload (.mp4, .mov, .avi)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Configuration file (defaults to the per-user uploader.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum part transfers in flight per file (overrides max_concurrent_parts)
    #[arg(long)]
    concurrency: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting video uploader");

    let mut config = config::Config::load(args.config.as_deref())?
        .with_token_override(std::env::var(config::TOKEN_ENV).ok());
    if let Some(limit) = args.concurrency {
        config.max_concurrent_parts = Some(limit);
    }
    tracing::info!(api = %config.api_base_url, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let all_done = rt.block_on(app::run(config, args.files))?;

    if !all_done {
        anyhow::bail!("one or more uploads failed");
    }
    Ok(())
}
