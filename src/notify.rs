//! Milestone notifications.
//!
//! Fan-out to zero or more subscribers over a broadcast channel. Delivery is
//! best-effort: the pipeline never blocks on, or fails because of, a
//! notification.

use std::fmt;

use tokio::sync::broadcast;

/// The four milestones a pipeline run announces, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    UploadReceived,
    SlicingComplete,
    DetectionComplete,
    ShapefileGenerated,
}

impl Milestone {
    pub fn message(&self) -> &'static str {
        match self {
            Milestone::UploadReceived => "Raster received. Slicing started.",
            Milestone::SlicingComplete => "Slicing complete. Starting weed detection.",
            Milestone::DetectionComplete => "Weed detection complete. Generating shapefile.",
            Milestone::ShapefileGenerated => "Shapefile generated. Zipping output.",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Publishes milestones to any number of subscribers.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Milestone>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Milestone> {
        self.tx.subscribe()
    }

    /// Send a milestone to all current subscribers. Having no subscribers is
    /// not an error.
    pub fn publish(&self, milestone: Milestone) {
        log::info!("{}", milestone.message());
        let _ = self.tx.send(milestone);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(16)
    }
}
