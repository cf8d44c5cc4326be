use crate::backend::Backend;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes tagged screenshots into the artifact directory.
///
/// Capturing is best effort: a failed screenshot is logged and otherwise
/// ignored.
#[derive(Debug, Clone)]
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/screenshot_<YYYYMMDD_HHMMSS>_<tag>.png`
    pub fn path_for(&self, tag: &str, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "screenshot_{}_{}.png",
            at.format("%Y%m%d_%H%M%S"),
            tag
        ))
    }

    pub async fn capture<B: Backend + ?Sized>(&self, backend: &mut B, tag: &str) -> Option<PathBuf> {
        let bytes = match backend.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to take screenshot '{}': {}", tag, e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(
                "Failed to create artifact directory {}: {}",
                self.dir.display(),
                e
            );
            return None;
        }

        let path = self.path_for(tag, Local::now());
        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}
