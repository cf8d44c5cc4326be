use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const ERROR_TOKENS: &[&str] = &["error", "failed", "not_found", "timeout", "security", "captcha"];
const SUCCESS_TOKENS: &[&str] = &["completed", "success", "confirmation"];

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    Error,
    Success,
    Other,
    Log,
    Lock,
    Unknown,
}

impl ArtifactCategory {
    pub const ALL: [ArtifactCategory; 6] = [
        ArtifactCategory::Error,
        ArtifactCategory::Success,
        ArtifactCategory::Other,
        ArtifactCategory::Log,
        ArtifactCategory::Lock,
        ArtifactCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactCategory::Error => "error screenshot",
            ArtifactCategory::Success => "success screenshot",
            ArtifactCategory::Other => "screenshot",
            ArtifactCategory::Log => "log file",
            ArtifactCategory::Lock => "lock file",
            ArtifactCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a file, from its name alone.
///
/// Error tokens win over success tokens, so `transfer_completed_timeout.png`
/// is an error screenshot.
pub fn categorize(file_name: &str) -> ArtifactCategory {
    let lower = file_name.to_lowercase();
    let extension = Path::new(&lower)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if IMAGE_EXTENSIONS.contains(&extension) {
        if ERROR_TOKENS.iter().any(|token| lower.contains(token)) {
            ArtifactCategory::Error
        } else if SUCCESS_TOKENS.iter().any(|token| lower.contains(token)) {
            ArtifactCategory::Success
        } else {
            ArtifactCategory::Other
        }
    } else {
        match extension {
            "log" => ArtifactCategory::Log,
            "lock" => ArtifactCategory::Lock,
            _ => ArtifactCategory::Unknown,
        }
    }
}

/// A file in the artifact directory, as seen on one retention pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub category: ArtifactCategory,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

impl Artifact {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whole days since modification, fraction discarded. Files stamped in
    /// the future are zero days old.
    pub fn age_days(&self, now: SystemTime) -> u64 {
        now.duration_since(self.modified)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / SECS_PER_DAY
    }
}
