use crate::cdp::CdpClient;
use crate::script;
use async_trait::async_trait;
use autoredeem_engine::backend::{Backend, BackendError, NavigationResult};
use autoredeem_engine::config::BrowserConfig as BrowserSettings;
use autoredeem_engine::locator::{ElementHandle, Predicate, Query};
use chromiumoxide::page::ScreenshotParams;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long resource activity must stay flat before the page counts as idle.
const IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Chromium over CDP with a persistent profile.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    settings: BrowserSettings,
}

impl HeadlessBackend {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            client: None,
            settings,
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    fn page(&self) -> Result<&chromiumoxide::Page, BackendError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(BackendError::NotReady)
    }

    async fn get_navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn call_on_element<T: serde::de::DeserializeOwned>(
        &self,
        function: &str,
        element: ElementHandle,
        extra: &[serde_json::Value],
    ) -> Result<T, BackendError> {
        let page = self.page()?;
        let mut args = vec![json!(element.0)];
        args.extend_from_slice(extra);
        script::call(page, function, &args)
            .await
            .map_err(|e| stale_or(e, element))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(BrowserSettings::default())
    }
}

/// Element operations throw "stale element" once the node is gone.
fn stale_or(err: BackendError, element: ElementHandle) -> BackendError {
    match err {
        BackendError::Script(msg) if msg.contains("stale element") => {
            BackendError::StaleElement(element.0)
        }
        other => other,
    }
}

fn predicate_expression(predicate: &Predicate) -> Result<String, BackendError> {
    Ok(match predicate {
        Predicate::SelectorAbsent(selector) => format!(
            "document.querySelector({}) === null",
            serde_json::to_string(selector)?
        ),
        Predicate::SelectorPresent(selector) => format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        ),
        Predicate::Script(expr) => format!("Boolean({})", expr),
    })
}

fn element_selector(element: ElementHandle) -> String {
    format!("[data-autoredeem-id=\"{}\"]", element.0)
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Chromium backend...");
        let client = CdpClient::launch(&self.settings)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, BackendError> {
        let page = self.page()?;

        info!("Navigating to: {}", url);
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Err(_) => return Err(BackendError::timeout(format!("navigation to {}", url), timeout)),
            Ok(Err(e)) => return Err(BackendError::Navigation(e.to_string())),
            Ok(Ok(_)) => {}
        }

        Self::get_navigation_result(page).await
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let page = self.page()?;
        Ok(page
            .url()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?
            .unwrap_or_default())
    }

    async fn page_text(&mut self) -> Result<String, BackendError> {
        script::call(self.page()?, "text", &[]).await
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), BackendError> {
        let page = self.page()?;
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let (ready_state, count): (String, u64) = script::call(page, "activity", &[]).await?;
            let now = Instant::now();
            if ready_state != "complete" || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = now;
            } else if now.duration_since(quiet_since) >= IDLE_QUIET_PERIOD {
                debug!("Network idle after {} resources", count);
                return Ok(());
            }
            if now >= deadline {
                return Err(BackendError::timeout("network idle", timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_predicate(
        &mut self,
        predicate: &Predicate,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        let page = self.page()?;
        let expression = predicate_expression(predicate)?;
        let deadline = Instant::now() + timeout;

        loop {
            if script::evaluate(page, &expression).await?.as_bool() == Some(true) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BackendError::timeout(predicate.to_string(), timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn locate(&mut self, query: &Query) -> Result<Vec<ElementHandle>, BackendError> {
        let ids: Vec<u32> = script::call(self.page()?, "locate", &[serde_json::to_value(query)?])
            .await?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, BackendError> {
        let visible: Option<bool> = self.call_on_element("visible", element, &[]).await?;
        visible.ok_or(BackendError::StaleElement(element.0))
    }

    async fn click(&mut self, element: ElementHandle, force: bool) -> Result<(), BackendError> {
        if force {
            let _: bool = self.call_on_element("click", element, &[]).await?;
            return Ok(());
        }

        let page = self.page()?;
        let target = page
            .find_element(element_selector(element))
            .await
            .map_err(|_| BackendError::StaleElement(element.0))?;
        target
            .click()
            .await
            .map_err(|e| BackendError::Other(format!("Click on {} failed: {}", element, e)))?;
        Ok(())
    }

    async fn fill(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError> {
        let _: bool = self.call_on_element("fill", element, &[json!(text)]).await?;
        Ok(())
    }

    async fn check(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        let checked: bool = self.call_on_element("check", element, &[]).await?;
        if checked {
            Ok(())
        } else {
            Err(BackendError::Other(format!("{} did not become checked", element)))
        }
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let bytes = self
            .page()?
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))?;

        Ok(bytes)
    }
}
