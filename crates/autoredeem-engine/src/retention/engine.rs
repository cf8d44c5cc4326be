use super::category::{Artifact, ArtifactCategory, categorize};
use super::policy::{CategoryRule, RetentionPolicy};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Artifact directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("Failed to read artifact directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTally {
    pub count: usize,
    pub bytes: u64,
}

/// What one retention pass removed, or would remove under `dry_run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub removed_count: usize,
    pub removed_bytes: u64,
    pub removed: Vec<PathBuf>,
    pub by_category: BTreeMap<ArtifactCategory, CategoryTally>,
    /// Files selected for removal that could not be deleted.
    pub failures: usize,
}

impl CleanupReport {
    fn record(&mut self, artifact: &Artifact) {
        self.removed_count += 1;
        self.removed_bytes += artifact.size_bytes;
        self.removed.push(artifact.path.clone());
        let tally = self.by_category.entry(artifact.category).or_default();
        tally.count += 1;
        tally.bytes += artifact.size_bytes;
    }
}

pub struct RetentionEngine {
    policy: RetentionPolicy,
}

impl RetentionEngine {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Every regular file directly inside `dir`, categorized.
    ///
    /// Entries whose metadata cannot be read are logged and skipped.
    pub fn scan(&self, dir: &Path) -> Result<Vec<Artifact>, RetentionError> {
        if !dir.is_dir() {
            return Err(RetentionError::MissingDirectory(dir.to_path_buf()));
        }
        let entries = fs::read_dir(dir).map_err(|source| RetentionError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Skipping {}: no modification time ({})", path.display(), e);
                    continue;
                }
            };
            let category = categorize(&entry.file_name().to_string_lossy());
            artifacts.push(Artifact {
                path,
                category,
                modified,
                size_bytes: metadata.len(),
            });
        }
        Ok(artifacts)
    }

    /// Artifacts newest first, for display.
    pub fn list(&self, dir: &Path) -> Result<Vec<Artifact>, RetentionError> {
        let mut artifacts = self.scan(dir)?;
        artifacts.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(artifacts)
    }

    /// The artifacts the policy evicts at `now`. Pure; touches nothing.
    pub fn candidates(&self, artifacts: &[Artifact], now: SystemTime) -> Vec<Artifact> {
        let mut selected = Vec::new();
        for category in ArtifactCategory::ALL {
            let Some(rule) = self.policy.rule_for(category) else {
                continue;
            };
            let members: Vec<&Artifact> = artifacts
                .iter()
                .filter(|artifact| artifact.category == category)
                .collect();
            selected.extend(evict(members, rule, now).into_iter().cloned());
        }
        selected
    }

    /// Apply the policy to `dir` using the current time.
    pub fn apply(&self, dir: &Path, dry_run: bool) -> Result<CleanupReport, RetentionError> {
        self.apply_at(dir, dry_run, SystemTime::now())
    }

    pub fn apply_at(
        &self,
        dir: &Path,
        dry_run: bool,
        now: SystemTime,
    ) -> Result<CleanupReport, RetentionError> {
        info!("Starting log cleanup for directory: {}", dir.display());
        if dry_run {
            info!("DRY RUN MODE - No files will be actually deleted");
        }

        let artifacts = self.scan(dir)?;
        let initial_bytes: u64 = artifacts.iter().map(|a| a.size_bytes).sum();
        info!("Initial directory size: {}", format_size(initial_bytes));

        let mut report = CleanupReport {
            dry_run,
            ..CleanupReport::default()
        };

        for artifact in self.candidates(&artifacts, now) {
            debug!(
                "Removing {}: {} ({} days old, {} bytes)",
                artifact.category,
                artifact.name(),
                artifact.age_days(now),
                artifact.size_bytes
            );
            if dry_run {
                report.record(&artifact);
                continue;
            }
            match fs::remove_file(&artifact.path) {
                Ok(()) => report.record(&artifact),
                Err(e) => {
                    warn!("Error removing {}: {}", artifact.name(), e);
                    report.failures += 1;
                }
            }
        }

        for (category, tally) in &report.by_category {
            info!(
                "  Removed {} {}(s) ({})",
                tally.count,
                category,
                format_size(tally.bytes)
            );
        }
        info!(
            "Cleanup completed: {} file(s), {} {}freed",
            report.removed_count,
            format_size(report.removed_bytes),
            if dry_run { "would be " } else { "" }
        );
        Ok(report)
    }
}

/// Apply `rule` to the members of one category: count bound first (newest
/// survive), then age bound on whatever the count bound kept.
fn evict(mut members: Vec<&Artifact>, rule: CategoryRule, now: SystemTime) -> Vec<&Artifact> {
    members.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

    let keep = rule.max_count.unwrap_or(usize::MAX).min(members.len());
    let overflow = members.split_off(keep);

    let mut evicted = overflow;
    if let Some(max_age_days) = rule.max_age_days {
        evicted.extend(
            members
                .into_iter()
                .filter(|artifact| artifact.age_days(now) > max_age_days),
        );
    }
    evicted
}

/// Human-readable byte count: `512.0B`, `1.5KB`, `3.2MB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}TB", size)
}
