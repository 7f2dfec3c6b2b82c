pub(crate) mod downloader;
mod lrclib;
mod orchestrator;
mod outcome;
mod types;

pub use downloader::LyricDownloader;
pub use orchestrator::LyricOrchestrator;
pub use types::{parse_batch, CompletionNotification, LyricPayload, TrackDescriptor};

use crate::config::Config;
use anyhow::Result;
use lrclib::LrcLibDownloader;
use std::sync::Arc;
use tracing::info;

/// Downloaders available by name, in registration order.
#[derive(Default)]
pub struct DownloaderRegistry {
    downloaders: Vec<Arc<dyn LyricDownloader>>,
}

impl DownloaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(LrcLibDownloader::new(&config.lrclib)?));

        info!(
            "Lyric downloaders registered: {}",
            registry.names().join(", ")
        );
        Ok(registry)
    }

    /// Registering a name twice replaces the earlier downloader.
    pub fn register(&mut self, downloader: Arc<dyn LyricDownloader>) {
        self.downloaders
            .retain(|d| !d.name().eq_ignore_ascii_case(downloader.name()));
        self.downloaders.push(downloader);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LyricDownloader>> {
        self.downloaders
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.downloaders.iter().map(|d| d.name()).collect()
    }
}
