use async_trait::async_trait;
pub use autoredeem_common::error::BackendError;
use autoredeem_common::locator::{ElementHandle, Predicate, Query};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// The browser capability the workflow consumes.
///
/// One implementation owns one browser session. Everything the engine needs
/// from a page goes through this trait so the state machine can be driven by
/// a scripted double in tests.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, open the persistent profile).
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and release the browser session.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a URL, failing if the load does not finish within `timeout`.
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, BackendError>;

    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Rendered text of the page body.
    async fn page_text(&mut self) -> Result<String, BackendError>;

    /// Wait until the page stops issuing network requests.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), BackendError>;

    async fn wait_for_predicate(
        &mut self,
        predicate: &Predicate,
        timeout: Duration,
    ) -> Result<(), BackendError>;

    /// All elements matching `query`, in document order.
    async fn locate(&mut self, query: &Query) -> Result<Vec<ElementHandle>, BackendError>;

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, BackendError>;

    /// Click an element. `force` skips actionability checks and dispatches
    /// the click directly on the element.
    async fn click(&mut self, element: ElementHandle, force: bool) -> Result<(), BackendError>;

    /// Replace the value of an input element.
    async fn fill(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError>;

    async fn check(&mut self, element: ElementHandle) -> Result<(), BackendError>;

    /// Capture a PNG screenshot of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError>;
}
