//! Best-effort removal of modals, banners and backdrops.
//!
//! Interstitials come and go between releases of the target site, so nothing
//! here is allowed to fail the workflow: per-strategy errors are swallowed and
//! the loop is bounded by [`DismissPolicy::max_attempts`].

use crate::backend::Backend;
use crate::resolution::LocatorResolver;
use autoredeem_common::locator::LocatorStrategy;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Bounds for one dismissal pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissPolicy {
    /// Upper bound on outer iterations, whatever the page keeps showing.
    pub max_attempts: u32,
    /// Pause after each successful dismissal so the overlay can animate out.
    pub settle_delay: Duration,
}

impl Default for DismissPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

pub struct OverlayDismisser {
    policy: DismissPolicy,
    dismiss: Vec<LocatorStrategy>,
    containers: Vec<LocatorStrategy>,
}

impl OverlayDismisser {
    pub fn new(
        policy: DismissPolicy,
        dismiss: Vec<LocatorStrategy>,
        containers: Vec<LocatorStrategy>,
    ) -> Self {
        Self {
            policy,
            dismiss,
            containers,
        }
    }

    pub fn policy(&self) -> DismissPolicy {
        self.policy
    }

    /// Dismiss whatever overlays are showing. Returns how many were clicked away.
    pub async fn dismiss_all<B: Backend + ?Sized>(&self, backend: &mut B) -> usize {
        info!("Checking for and dismissing modal dialogs...");
        let mut dismissed = 0;

        for attempt in 1..=self.policy.max_attempts {
            if self.dismiss_one(backend).await {
                dismissed += 1;
                tokio::time::sleep(self.policy.settle_delay).await;
                continue;
            }

            if !self.container_visible(backend).await {
                break;
            }
            debug!(
                "Dialog still visible but no dismiss control matched (attempt {}/{})",
                attempt, self.policy.max_attempts
            );
        }

        if dismissed > 0 {
            info!("Dismissed {} modal dialog(s)", dismissed);
        } else {
            info!("No modal dialogs found");
        }
        dismissed
    }

    /// Try each dismiss strategy in priority order; click the first that matches.
    async fn dismiss_one<B: Backend + ?Sized>(&self, backend: &mut B) -> bool {
        for (index, strategy) in self.dismiss.iter().enumerate() {
            let element = match LocatorResolver::probe(backend, strategy).await {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Dismiss strategy {} errored, skipping: {}", index + 1, e);
                    continue;
                }
            };

            match backend.click(element, strategy.force).await {
                Ok(()) => {
                    info!(
                        "Found modal dialog, using dismissal strategy {} ({})",
                        index + 1,
                        strategy
                    );
                    return true;
                }
                Err(e) => {
                    debug!("Dismiss click {} failed, skipping: {}", index + 1, e);
                }
            }
        }
        false
    }

    async fn container_visible<B: Backend + ?Sized>(&self, backend: &mut B) -> bool {
        LocatorResolver::resolve(backend, &self.containers)
            .await
            .is_found()
    }
}
