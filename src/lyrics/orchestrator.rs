use super::{
    downloader::LyricDownloader,
    outcome::{classify, Outcome},
    types::{CompletionNotification, TrackDescriptor},
    DownloaderRegistry,
};
use crate::config::DownloadConfig;
use crate::events::EventPublisher;
use crate::status::{StatusReporter, TrackStatus};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("lyric downloader \"{name}\" is not available (registered: {available})")]
    DownloaderUnavailable { name: String, available: String },
}

/// Runs a batch of tracks through a downloader with bounded parallelism.
///
/// Every track ends in exactly one of two side effects: a
/// [`CompletionNotification`] on the publisher when a lyric was downloaded,
/// or a status update on the reporter otherwise. Per-track errors never
/// leave the worker that hit them.
pub struct LyricOrchestrator {
    registry: Arc<DownloaderRegistry>,
    downloader: String,
    publisher: Arc<dyn EventPublisher>,
    status: Arc<dyn StatusReporter>,
    max_concurrent: usize,
    timeout: Duration,
    cancel: CancellationToken,
}

impl LyricOrchestrator {
    pub fn new(
        registry: Arc<DownloaderRegistry>,
        publisher: Arc<dyn EventPublisher>,
        status: Arc<dyn StatusReporter>,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            registry,
            downloader: config.downloader.clone(),
            publisher,
            status,
            max_concurrent: config.max_concurrent.clamp(1, Semaphore::MAX_PERMITS),
            timeout: config.timeout(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Starts the batch on the runtime and returns immediately.
    pub fn spawn(
        self: &Arc<Self>,
        batch: Vec<TrackDescriptor>,
    ) -> JoinHandle<Result<(), OrchestratorError>> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run(batch).await })
    }

    /// Processes the batch and waits for every track to finish.
    ///
    /// Fails only when the configured downloader cannot be resolved, in which
    /// case no track is touched.
    pub async fn run(&self, batch: Vec<TrackDescriptor>) -> Result<(), OrchestratorError> {
        let downloader = self.resolve_downloader()?;

        if batch.is_empty() {
            debug!("Empty lyric batch, nothing to do");
            return Ok(());
        }

        info!(
            "Downloading lyrics for {} tracks with {} ({} at a time)",
            batch.len(),
            downloader.name(),
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut workers = JoinSet::new();
        let mut pending = batch.into_iter();
        let mut cancelled = 0;

        for track in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                self.status.set_status(track.index(), TrackStatus::Cancelled);
                cancelled += 1;
                break;
            };

            let downloader = downloader.clone();
            let publisher = self.publisher.clone();
            let status = self.status.clone();
            let timeout = self.timeout;

            workers.spawn(async move {
                let _permit = permit;
                let index = track.index();
                let outcome = fetch(downloader, &track, timeout).await;

                std::panic::catch_unwind(AssertUnwindSafe(|| {
                    report(track, outcome, publisher.as_ref(), status.as_ref())
                }))
                .unwrap_or_else(|_| {
                    error!("Reporting the outcome of track {} panicked", index);
                    status.set_status(index, TrackStatus::Failed);
                    TrackStatus::Failed
                })
            });
        }

        for track in pending {
            self.status.set_status(track.index(), TrackStatus::Cancelled);
            cancelled += 1;
        }
        if cancelled > 0 {
            info!("Lyric batch cancelled, {} tracks not started", cancelled);
        }

        let (mut downloaded, mut not_found, mut failed) = (0, 0, 0);
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(TrackStatus::Downloaded) => downloaded += 1,
                Ok(TrackStatus::NotFound) => not_found += 1,
                Ok(_) => failed += 1,
                Err(e) => error!("Lyric worker terminated abnormally: {}", e),
            }
        }

        info!(
            "Lyric batch finished: {} downloaded, {} not found, {} failed, {} cancelled",
            downloaded, not_found, failed, cancelled
        );
        Ok(())
    }

    fn resolve_downloader(&self) -> Result<Arc<dyn LyricDownloader>, OrchestratorError> {
        self.registry.get(&self.downloader).ok_or_else(|| {
            let available = self.registry.names().join(", ");
            error!(
                "Lyric downloader {} not found (registered: {})",
                self.downloader, available
            );
            OrchestratorError::DownloaderUnavailable {
                name: self.downloader.clone(),
                available,
            }
        })
    }
}

/// Calls the downloader on its own task so a panic or a hung request stays
/// contained to this track.
async fn fetch(
    downloader: Arc<dyn LyricDownloader>,
    track: &TrackDescriptor,
    timeout: Duration,
) -> Outcome {
    debug!("Fetching lyric for {}", track);

    let song = track.title().to_string();
    let artist = track.artist().to_string();
    let mut call = tokio::spawn(async move { downloader.download(&song, &artist).await });

    match tokio::time::timeout(timeout, &mut call).await {
        Ok(Ok(result)) => classify(result),
        Ok(Err(e)) => Outcome::Failure(format!("downloader crashed: {e}")),
        Err(_) => {
            call.abort();
            // The slot is only released once the aborted call has stopped
            let _ = call.await;
            Outcome::Failure(format!("timed out after {:?}", timeout))
        }
    }
}

fn report(
    track: TrackDescriptor,
    outcome: Outcome,
    publisher: &dyn EventPublisher,
    status: &dyn StatusReporter,
) -> TrackStatus {
    match outcome {
        Outcome::Success(lyric) => {
            debug!("Downloaded {} bytes of lyric for {}", lyric.len(), track);
            publisher.publish(CompletionNotification { track, lyric });
            TrackStatus::Downloaded
        }
        Outcome::NotFound => {
            info!("No lyric exists for {}", track);
            status.set_status(track.index(), TrackStatus::NotFound);
            TrackStatus::NotFound
        }
        Outcome::Failure(reason) => {
            warn!("Lyric download failed for {}: {}", track, reason);
            status.set_status(track.index(), TrackStatus::Failed);
            TrackStatus::Failed
        }
    }
}
