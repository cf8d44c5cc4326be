use thiserror::Error;

/// Errors surfaced by a browser backend.
///
/// Callers decide which of these are fatal: the resolver treats every variant
/// as "this strategy did not match", the workflow treats them as unexpected.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not ready (call launch first)")]
    NotReady,

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },

    #[error("Element {0} is no longer attached to the page")]
    StaleElement(u32),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    pub fn timeout(what: impl Into<String>, waited: std::time::Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
