//! Artifact retention: categorize what the workflow left behind and evict by
//! age or count.

pub mod category;
pub mod engine;
pub mod policy;

pub use category::{Artifact, ArtifactCategory, categorize};
pub use engine::{CleanupReport, RetentionEngine, RetentionError, format_size};
pub use policy::{CategoryRule, LOCK_MAX_AGE_DAYS, RetentionPolicy};
