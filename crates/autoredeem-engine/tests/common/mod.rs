//! Scripted in-memory site used by the integration tests.
//!
//! A site is a set of named scenes (one per page). Each scene has a URL,
//! rendered text and elements identified by the exact `Query` that finds
//! them. Clicking an element can switch scene, remove the element or reroute
//! a URL, which is enough to model login redirects, modals and the
//! payout -> confirm -> done flow.

#![allow(dead_code)]

use async_trait::async_trait;
use autoredeem_engine::backend::{Backend, BackendError, NavigationResult};
use autoredeem_engine::config::{AutoRedeemConfig, DelayConfig};
use autoredeem_engine::locator::{ElementHandle, Predicate, Query};
use autoredeem_engine::strategies;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const PAYOUT_URL: &str = "https://poshmark.com/account/payout-options";
pub const LOGIN_URL: &str = "https://poshmark.com/login?pmrd=payout-options";
pub const CONFIRM_URL: &str = "https://poshmark.com/account/payout-options/confirm_redeem";

#[derive(Debug, Clone)]
pub enum Effect {
    Nothing,
    /// Replace the current page with another scene.
    Goto(&'static str),
    /// The element disappears (a dismissed modal).
    Remove,
    /// Future navigations to `url` land on `scene`.
    Route { url: &'static str, scene: &'static str },
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub query: Query,
    pub visible: bool,
    pub on_click: Effect,
    pub click_fails: bool,
    removed: bool,
}

impl FakeElement {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            visible: true,
            on_click: Effect::Nothing,
            click_fails: false,
            removed: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub url: String,
    pub text: String,
    pub elements: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct FakeSite {
    scenes: HashMap<&'static str, Scene>,
    arena: Vec<FakeElement>,
    routes: HashMap<String, &'static str>,
    current: Option<&'static str>,

    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub located: Vec<Query>,
    pub clicked: Vec<Query>,
    pub filled: Vec<(Query, String)>,
    pub screenshots: usize,
    pub predicate_waits: usize,

    pub fail_launch: bool,
    pub fail_navigation: bool,
    pub fail_screenshots: bool,
    pub network_idle_times_out: bool,
    /// Every predicate wait times out, as with a spinner that never clears.
    pub predicate_times_out: bool,
    /// Every `locate` call pends forever, simulating a stuck page.
    pub hang_on_locate: bool,
    /// `launch` pends forever, simulating a browser that is slow to start.
    pub hang_on_launch: bool,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(mut self, name: &'static str, url: &str, text: &str) -> Self {
        self.scenes.insert(
            name,
            Scene {
                url: url.to_string(),
                text: text.to_string(),
                elements: Vec::new(),
            },
        );
        self
    }

    pub fn element(mut self, scene: &'static str, element: FakeElement) -> Self {
        let index = self.arena.len();
        self.arena.push(element);
        if let Some(scene) = self.scenes.get_mut(scene) {
            scene.elements.push(index);
        }
        self
    }

    pub fn route(mut self, url: &str, scene: &'static str) -> Self {
        self.routes.insert(url.to_string(), scene);
        self
    }

    pub fn current_scene(&self) -> Option<&'static str> {
        self.current
    }

    pub fn located_any(&self, queries: &[Query]) -> bool {
        self.located.iter().any(|q| queries.contains(q))
    }

    fn live(&self, handle: ElementHandle) -> Result<&FakeElement, BackendError> {
        let scene = self
            .current
            .and_then(|name| self.scenes.get(name))
            .ok_or(BackendError::NotReady)?;
        let index = handle.0 as usize;
        match self.arena.get(index) {
            Some(element) if scene.elements.contains(&index) && !element.removed => Ok(element),
            _ => Err(BackendError::StaleElement(handle.0)),
        }
    }

    fn current(&self) -> Result<&Scene, BackendError> {
        self.current
            .and_then(|name| self.scenes.get(name))
            .ok_or(BackendError::NotReady)
    }
}

#[async_trait]
impl Backend for FakeSite {
    async fn launch(&mut self) -> Result<(), BackendError> {
        self.launches += 1;
        if self.hang_on_launch {
            std::future::pending::<()>().await;
        }
        if self.fail_launch {
            return Err(BackendError::Other("no browser available".into()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.closes += 1;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.launches > self.closes
    }

    async fn navigate(
        &mut self,
        url: &str,
        _timeout: Duration,
    ) -> Result<NavigationResult, BackendError> {
        self.navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(BackendError::Navigation(format!("net::ERR_FAILED at {}", url)));
        }
        let scene = self
            .routes
            .get(url)
            .copied()
            .ok_or_else(|| BackendError::Navigation(format!("no route for {}", url)))?;
        self.current = Some(scene);
        Ok(NavigationResult {
            url: self.current()?.url.clone(),
            title: scene.to_string(),
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.current()?.url.clone())
    }

    async fn page_text(&mut self) -> Result<String, BackendError> {
        Ok(self.current()?.text.clone())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), BackendError> {
        if self.network_idle_times_out {
            return Err(BackendError::timeout("network idle", timeout));
        }
        Ok(())
    }

    async fn wait_for_predicate(
        &mut self,
        predicate: &Predicate,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        self.predicate_waits += 1;
        if self.predicate_times_out {
            return Err(BackendError::timeout(predicate.to_string(), timeout));
        }
        Ok(())
    }

    async fn locate(&mut self, query: &Query) -> Result<Vec<ElementHandle>, BackendError> {
        if self.hang_on_locate {
            std::future::pending::<()>().await;
        }
        self.located.push(query.clone());
        let scene = self.current()?;
        Ok(scene
            .elements
            .iter()
            .copied()
            .filter(|&index| {
                let element = &self.arena[index];
                !element.removed && element.query == *query
            })
            .map(|index| ElementHandle(index as u32))
            .collect())
    }

    async fn is_visible(&mut self, element: ElementHandle) -> Result<bool, BackendError> {
        Ok(self.live(element)?.visible)
    }

    async fn click(&mut self, element: ElementHandle, force: bool) -> Result<(), BackendError> {
        let target = self.live(element)?.clone();
        if target.click_fails {
            return Err(BackendError::Script("element is detached".into()));
        }
        if !target.visible && !force {
            return Err(BackendError::Other("element is not visible".into()));
        }
        self.clicked.push(target.query.clone());
        match target.on_click {
            Effect::Nothing => {}
            Effect::Goto(scene) => self.current = Some(scene),
            Effect::Remove => self.arena[element.0 as usize].removed = true,
            Effect::Route { url, scene } => {
                self.routes.insert(url.to_string(), scene);
            }
        }
        Ok(())
    }

    async fn fill(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError> {
        let target = self.live(element)?.clone();
        self.filled.push((target.query, text.to_string()));
        Ok(())
    }

    async fn check(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        let target = self.live(element)?.clone();
        self.clicked.push(target.query);
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        if self.fail_screenshots {
            return Err(BackendError::Script("capture failed".into()));
        }
        self.screenshots += 1;
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }
}

/// The first query of a built-in table.
pub fn first_query(table: &[autoredeem_engine::locator::LocatorStrategy]) -> Query {
    table[0].query.clone()
}

/// Configuration with every pause zeroed and artifacts under `log_dir`.
pub fn test_config(log_dir: &Path) -> AutoRedeemConfig {
    let mut config = AutoRedeemConfig::default();
    config.delays = DelayConfig::none();
    config.artifacts.log_dir = log_dir.to_path_buf();
    config.browser.user_data_dir = log_dir.join("profile");
    config
}

/// A logged-in site: payout page with `balance_text`, confirmation page and
/// a final page, reachable with the first strategy of each default table.
pub fn payout_site(balance_text: &str) -> FakeSite {
    FakeSite::new()
        .scene(
            "payout",
            PAYOUT_URL,
            &format!("Payout Options Redeemable {} Bank Direct Deposit", balance_text),
        )
        .scene("confirm", CONFIRM_URL, "Confirm Redeem $12.00 to Bank Direct Deposit")
        .scene("done", PAYOUT_URL, "Your redemption is processing")
        .route(PAYOUT_URL, "payout")
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::payout_method())),
        )
        .element(
            "payout",
            FakeElement::new(first_query(&strategies::continue_button()))
                .on_click(Effect::Goto("confirm")),
        )
        .element(
            "confirm",
            FakeElement::new(first_query(&strategies::redeem_button()))
                .on_click(Effect::Goto("done")),
        )
}

/// `payout_site` behind a login wall: the payout URL redirects to a login
/// form until the login button is clicked.
pub fn login_walled_site(balance_text: &str) -> FakeSite {
    payout_site(balance_text)
        .scene("login", LOGIN_URL, "Log in to Poshmark")
        .route(PAYOUT_URL, "login")
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_email())),
        )
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_password())),
        )
        .element(
            "login",
            FakeElement::new(first_query(&strategies::login_submit())).on_click(Effect::Route {
                url: PAYOUT_URL,
                scene: "payout",
            }),
        )
}

/// Files currently in `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
