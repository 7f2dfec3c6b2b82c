use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod app;
mod config;
mod events;
mod lyrics;
mod status;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// File with one "Artist - Song" entry per line
    #[arg(short, long)]
    input: Option<String>,

    /// Maximum number of concurrent downloads
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Name of the lyric downloader to use
    #[arg(short, long)]
    downloader: Option<String>,

    /// Tracks given as "Artist - Song"
    tracks: Vec<String>,
}

fn load_config(args: &Args) -> Result<config::Config> {
    let mut config = match config::get_config_path(args.config.as_deref()) {
        Some(path) => config::Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => config::Config::default(),
    };

    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut config::Config, args: &Args) {
    if let Some(concurrency) = args.concurrency {
        config.download.max_concurrent = concurrency;
    }
    if let Some(downloader) = &args.downloader {
        config.download.downloader = downloader.clone();
    }
}

fn load_batch(args: &Args) -> Result<Vec<lyrics::TrackDescriptor>> {
    let mut entries = Vec::new();

    if let Some(path) = &args.input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read track list {}", path))?;
        entries.extend(content.lines().map(str::to_string));
    }
    entries.extend(args.tracks.iter().cloned());

    lyrics::parse_batch(entries.iter().map(String::as_str))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting lyricgrab...");

    let batch = load_batch(&args)?;
    if batch.is_empty() {
        info!("No tracks given, nothing to download");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight downloads");
            interrupt.cancel();
        }
    });

    app::run(config, batch, cancel).await
}
