//! Filesystem helpers shared by the index, sweeper and extractor.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Whether a path names an MP4 media file.
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false)
}

/// Convert a filesystem timestamp to milliseconds since the Unix epoch.
pub fn system_time_ms(time: SystemTime) -> MediaResult<i64> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|e| MediaError::internal(format!("timestamp before epoch: {}", e)))
}

/// Last-modification time of a file in milliseconds since the Unix epoch.
pub async fn modified_ms(path: impl AsRef<Path>) -> MediaResult<i64> {
    let meta = fs::metadata(path.as_ref()).await?;
    system_time_ms(meta.modified()?)
}

/// Remove every path, continuing past failures.
///
/// Returns the paths that could not be removed together with the error.
pub async fn remove_all_best_effort(paths: &[PathBuf]) -> Vec<(PathBuf, std::io::Error)> {
    let mut failures = Vec::new();

    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
            failures.push((path.clone(), e));
        }
    }

    failures
}
