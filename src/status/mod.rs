use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    Pending,
    Downloaded,
    NotFound,
    Failed,
    Cancelled,
}

impl TrackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrackStatus::Pending => "Pending",
            TrackStatus::Downloaded => "Downloaded",
            TrackStatus::NotFound => "Lyric not found",
            TrackStatus::Failed => "Download failed",
            TrackStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Side channel for per-track status, keyed by the track index.
///
/// Implementations must accept concurrent calls for distinct indices.
pub trait StatusReporter: Send + Sync {
    fn set_status(&self, index: usize, status: TrackStatus);
}

/// In-memory status table read by whatever renders progress.
#[derive(Debug, Default)]
pub struct StatusBoard {
    entries: Mutex<BTreeMap<usize, TrackStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current statuses ordered by index
    pub fn snapshot(&self) -> Vec<(usize, TrackStatus)> {
        self.entries
            .lock()
            .map(|entries| entries.iter().map(|(i, s)| (*i, *s)).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, status: TrackStatus) -> usize {
        self.snapshot().iter().filter(|(_, s)| *s == status).count()
    }
}

impl StatusReporter for StatusBoard {
    fn set_status(&self, index: usize, status: TrackStatus) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(index, status);
            }
            Err(e) => warn!("Status board unavailable, dropping update for {}: {}", index, e),
        }
    }
}
