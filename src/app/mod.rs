use crate::config::Config;
use crate::lyrics::{
    CompletionNotification, DownloaderRegistry, LyricOrchestrator, LyricPayload, TrackDescriptor,
};
use crate::status::{StatusBoard, StatusReporter, TrackStatus};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run(
    config: Config,
    batch: Vec<TrackDescriptor>,
    cancel: CancellationToken,
) -> Result<()> {
    let registry = DownloaderRegistry::from_config(&config)
        .context("Failed to initialize lyric downloaders")?;

    let statuses = run_with_registry(Arc::new(registry), &config, batch.clone(), cancel).await?;
    log_summary(&batch, &statuses);
    Ok(())
}

/// Runs one batch and returns the final status of every track, ordered by
/// index.
pub async fn run_with_registry(
    registry: Arc<DownloaderRegistry>,
    config: &Config,
    batch: Vec<TrackDescriptor>,
    cancel: CancellationToken,
) -> Result<Vec<(usize, TrackStatus)>> {
    let board = Arc::new(StatusBoard::new());
    for track in &batch {
        board.set_status(track.index(), TrackStatus::Pending);
    }

    // Sized to the batch so the consumer can never lag behind
    let (tx, rx) = broadcast::channel(batch.len().max(1));
    let consumer = tokio::spawn(consume_notifications(rx, board.clone()));

    let orchestrator = Arc::new(
        LyricOrchestrator::new(registry, Arc::new(tx), board.clone(), &config.download)
            .with_cancel_token(cancel),
    );

    let result = orchestrator
        .spawn(batch)
        .await
        .context("Lyric batch task panicked")?;

    // Dropping the last sender lets the consumer drain and stop
    drop(orchestrator);
    let received = consumer.await.context("Notification consumer panicked")?;
    info!("Received {} lyric notifications", received);

    result?;
    info!(
        "Done: {} downloaded, {} not found, {} failed, {} cancelled",
        board.count(TrackStatus::Downloaded),
        board.count(TrackStatus::NotFound),
        board.count(TrackStatus::Failed),
        board.count(TrackStatus::Cancelled)
    );
    Ok(board.snapshot())
}

async fn consume_notifications(
    mut rx: broadcast::Receiver<CompletionNotification>,
    board: Arc<StatusBoard>,
) -> usize {
    let mut received = 0;

    loop {
        match rx.recv().await {
            Ok(notification) => {
                info!(
                    "Lyric downloaded for {} ({} bytes)",
                    notification.track,
                    notification.lyric.len()
                );
                debug!(
                    "First line of {}: {}",
                    notification.track,
                    first_line(&notification.lyric)
                );
                board.set_status(notification.track.index(), TrackStatus::Downloaded);
                received += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notification consumer lagged, {} notifications lost", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    received
}

/// First non-blank line of a lyric, lossily decoded
fn first_line(lyric: &LyricPayload) -> String {
    String::from_utf8_lossy(lyric.as_bytes())
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn log_summary(batch: &[TrackDescriptor], statuses: &[(usize, TrackStatus)]) {
    for track in batch {
        let status = statuses
            .iter()
            .find(|(index, _)| *index == track.index())
            .map(|(_, status)| *status)
            .unwrap_or(TrackStatus::Pending);
        info!("[{}] {}: {}", track.index(), track, status);
    }
}
