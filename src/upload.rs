//! Remote object-storage boundary.

use std::path::Path;

/// Uploads a finished archive to remote storage.
///
/// Optional collaborator: the orchestrator logs a failed upload as a warning
/// and still returns the archive to the caller.
pub trait ArchiveUploader: Send + Sync {
    /// Upload `archive` to `destination` within `bucket`. Returns a
    /// human-readable status message on success.
    fn upload(&self, archive: &Path, destination: &str, bucket: &str) -> anyhow::Result<String>;
}
