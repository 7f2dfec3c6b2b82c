use super::types::LyricPayload;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The track has no lyric, e.g. it is instrumental
    #[error("no lyric exists for this track")]
    NotFound,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status: {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait LyricDownloader: Send + Sync {
    /// Name used to look the downloader up in the registry
    fn name(&self) -> &'static str;

    /// Fetch the lyric for a track. `Ok(None)` means the downloader produced
    /// no data without claiming the lyric does not exist.
    async fn download(
        &self,
        song: &str,
        artist: &str,
    ) -> Result<Option<LyricPayload>, DownloadError>;
}
