use autoredeem_common::error::BackendError;
use autoredeem_common::locator::{ElementHandle, StrategyAction};
use thiserror::Error;

/// Outcome of evaluating an ordered strategy table.
///
/// Not finding anything is an ordinary value; callers decide whether it is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found {
        strategy_index: usize,
        element: ElementHandle,
    },
    NotFound {
        attempted: usize,
    },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    pub fn element(&self) -> Option<ElementHandle> {
        match self {
            Resolution::Found { element, .. } => Some(*element),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn strategy_index(&self) -> Option<usize> {
        match self {
            Resolution::Found { strategy_index, .. } => Some(*strategy_index),
            Resolution::NotFound { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Fill strategy {strategy} needs input text")]
    MissingInput { strategy: String },

    #[error("{action:?} on {element} failed: {source}")]
    Backend {
        action: StrategyAction,
        element: ElementHandle,
        #[source]
        source: BackendError,
    },
}
