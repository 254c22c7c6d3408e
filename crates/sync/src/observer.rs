use std::fmt;

use tracing::{info, warn};

use crate::friend::PullError;

/// States a pull cycle moves through, broadcast to every registered
/// observer in order: `Downloading`, then `Downloaded` and `Saving`, then
/// either `Saved` or `Skipped`. A failure anywhere replaces the rest of
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullEvent {
    /// Delivered once to an observer at the moment it is attached.
    Added,
    Downloading,
    Downloaded,
    Saving,
    /// The remote chain won and was persisted.
    Saved,
    /// The remote chain was rejected; nothing was persisted. This is the
    /// expected outcome for an unverified or shorter chain, not an error.
    Skipped,
}

impl fmt::Display for PullEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PullEvent::Added => "ADDED",
            PullEvent::Downloading => "DOWNLOADING",
            PullEvent::Downloaded => "DOWNLOADED",
            PullEvent::Saving => "SAVING",
            PullEvent::Saved => "SAVED",
            PullEvent::Skipped => "SKIPPED",
        };
        f.write_str(name)
    }
}

/// A subscriber to a friend's pull progress.
pub trait PullObserver: Send + Sync {
    fn on(&self, event: PullEvent);
    fn on_failed(&self, error: &PullError);
}

/// Logs every event under the observer's name.
pub struct LoggingObserver {
    name: String,
}

impl LoggingObserver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl PullObserver for LoggingObserver {
    fn on(&self, event: PullEvent) {
        info!(observer = %self.name, event = %event, "pull event");
    }

    fn on_failed(&self, error: &PullError) {
        warn!(observer = %self.name, error = %error, "pull failed");
    }
}
