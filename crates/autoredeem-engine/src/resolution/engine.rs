//! Ordered-fallback element resolution.
//!
//! A strategy table is plain data evaluated top to bottom. The first strategy
//! whose first match is visible (or that is marked `force`) wins; nothing on
//! the page is touched while resolving.

use crate::backend::{Backend, BackendError};
use crate::resolution::result::{ActionError, Resolution};
use autoredeem_common::locator::{ElementHandle, LocatorStrategy, StrategyAction};
use tracing::{debug, warn};

pub struct LocatorResolver;

impl LocatorResolver {
    /// Evaluate `strategies` in order and return the first usable match.
    ///
    /// Backend errors while probing a strategy count as a non-match.
    pub async fn resolve<B: Backend + ?Sized>(
        backend: &mut B,
        strategies: &[LocatorStrategy],
    ) -> Resolution {
        for (index, strategy) in strategies.iter().enumerate() {
            match Self::probe(backend, strategy).await {
                Ok(Some(element)) => {
                    debug!("Strategy {} matched: {}", index + 1, strategy);
                    return Resolution::Found {
                        strategy_index: index,
                        element,
                    };
                }
                Ok(None) => {
                    debug!("Strategy {} found nothing: {}", index + 1, strategy);
                }
                Err(e) => {
                    debug!("Strategy {} failed ({}): {}", index + 1, strategy, e);
                }
            }
        }
        Resolution::NotFound {
            attempted: strategies.len(),
        }
    }

    /// Check a single strategy: its first match, if any and if usable.
    pub async fn probe<B: Backend + ?Sized>(
        backend: &mut B,
        strategy: &LocatorStrategy,
    ) -> Result<Option<ElementHandle>, BackendError> {
        let matches = backend.locate(&strategy.query).await?;
        let Some(&first) = matches.first() else {
            return Ok(None);
        };
        if strategy.force || backend.is_visible(first).await? {
            Ok(Some(first))
        } else {
            Ok(None)
        }
    }

    /// Invoke the strategy's declared action on an element it resolved.
    pub async fn perform<B: Backend + ?Sized>(
        backend: &mut B,
        strategy: &LocatorStrategy,
        element: ElementHandle,
        input: Option<&str>,
    ) -> Result<(), ActionError> {
        let result = match strategy.action {
            StrategyAction::Click => backend.click(element, strategy.force).await,
            StrategyAction::Check => backend.check(element).await,
            StrategyAction::Fill => {
                let text = input.ok_or_else(|| ActionError::MissingInput {
                    strategy: strategy.to_string(),
                })?;
                backend.fill(element, text).await
            }
        };
        result.map_err(|source| ActionError::Backend {
            action: strategy.action,
            element,
            source,
        })
    }

    /// Resolve, then perform the winning strategy's action.
    ///
    /// If the action itself fails, evaluation resumes with the strategies
    /// after the one that failed. `NotFound` means every strategy was either
    /// absent or failed to act.
    pub async fn resolve_and_perform<B: Backend + ?Sized>(
        backend: &mut B,
        strategies: &[LocatorStrategy],
        input: Option<&str>,
    ) -> Resolution {
        let mut start = 0;
        while start < strategies.len() {
            match Self::resolve(backend, &strategies[start..]).await {
                Resolution::Found {
                    strategy_index,
                    element,
                } => {
                    let index = start + strategy_index;
                    let strategy = &strategies[index];
                    match Self::perform(backend, strategy, element, input).await {
                        Ok(()) => {
                            return Resolution::Found {
                                strategy_index: index,
                                element,
                            };
                        }
                        Err(e) => {
                            warn!("Strategy {} failed: {}", index + 1, e);
                            start = index + 1;
                        }
                    }
                }
                Resolution::NotFound { .. } => break,
            }
        }
        Resolution::NotFound {
            attempted: strategies.len(),
        }
    }
}
