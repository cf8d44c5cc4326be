use super::category::ArtifactCategory;
use serde::{Deserialize, Serialize};

/// Lock records only ever matter for the current day; this ceiling is not
/// configurable.
pub const LOCK_MAX_AGE_DAYS: u64 = 7;

/// Eviction rule for one category. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

impl CategoryRule {
    pub const fn max_age(days: u64) -> Self {
        Self {
            max_age_days: Some(days),
            max_count: None,
        }
    }

    pub const fn keep_latest(count: usize) -> Self {
        Self {
            max_age_days: None,
            max_count: Some(count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub error: CategoryRule,
    pub success: CategoryRule,
    pub other: CategoryRule,
    pub log: CategoryRule,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            error: CategoryRule::max_age(30),
            success: CategoryRule::keep_latest(10),
            other: CategoryRule::max_age(7),
            log: CategoryRule::max_age(30),
        }
    }
}

impl RetentionPolicy {
    /// The rule applied to `category`; `None` means never evict.
    pub fn rule_for(&self, category: ArtifactCategory) -> Option<CategoryRule> {
        match category {
            ArtifactCategory::Error => Some(self.error),
            ArtifactCategory::Success => Some(self.success),
            ArtifactCategory::Other => Some(self.other),
            ArtifactCategory::Log => Some(self.log),
            ArtifactCategory::Lock => Some(CategoryRule::max_age(LOCK_MAX_AGE_DAYS)),
            ArtifactCategory::Unknown => None,
        }
    }
}
