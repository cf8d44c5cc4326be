//! Built-in strategy tables for the payout-options page.
//!
//! Each table is ordered most-specific first. The markup on the target site
//! changes between releases, so later entries are progressively looser.

use autoredeem_common::locator::{LocatorStrategy, Query};
use serde::{Deserialize, Serialize};

/// Every strategy table the workflow uses. Any table can be replaced from the
/// configuration file; missing tables fall back to the built-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTables {
    pub login_detect: Vec<LocatorStrategy>,
    pub login_email: Vec<LocatorStrategy>,
    pub login_password: Vec<LocatorStrategy>,
    pub login_submit: Vec<LocatorStrategy>,
    pub overlay_dismiss: Vec<LocatorStrategy>,
    pub overlay_containers: Vec<LocatorStrategy>,
    pub payout_method: Vec<LocatorStrategy>,
    pub continue_button: Vec<LocatorStrategy>,
    pub redeem_button: Vec<LocatorStrategy>,
}

impl Default for StrategyTables {
    fn default() -> Self {
        Self {
            login_detect: login_detect(),
            login_email: login_email(),
            login_password: login_password(),
            login_submit: login_submit(),
            overlay_dismiss: overlay_dismiss(),
            overlay_containers: overlay_containers(),
            payout_method: payout_method(),
            continue_button: continue_button(),
            redeem_button: redeem_button(),
        }
    }
}

pub fn login_detect() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::fill(Query::label("Email")).labelled("email label"),
        LocatorStrategy::fill(Query::placeholder("username or email"))
            .labelled("email placeholder"),
    ]
}

pub fn login_email() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::fill(Query::placeholder("username or email"))
            .labelled("email placeholder"),
        LocatorStrategy::fill(Query::label("Email")).labelled("email label"),
        LocatorStrategy::fill(Query::css(
            "input[type='email'], input[name*='login'], input[name*='email']",
        ))
        .labelled("email input"),
    ]
}

pub fn login_password() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::fill(Query::placeholder("password")).labelled("password placeholder"),
        LocatorStrategy::fill(Query::css("input[type='password']")).labelled("password input"),
    ]
}

pub fn login_submit() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::role("button", "login")).labelled("login button"),
        LocatorStrategy::click(Query::css("button[type='submit']")).labelled("submit button"),
    ]
}

/// Dismiss controls, explicit labels first and backdrops last.
pub fn overlay_dismiss() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::role("button", "got it")).labelled("got it"),
        LocatorStrategy::click(Query::role("button", "^ok$")).labelled("ok"),
        LocatorStrategy::click(Query::role("button", "close")).labelled("close"),
        LocatorStrategy::click(Query::role("button", "dismiss")).labelled("dismiss"),
        LocatorStrategy::click(Query::css_with_text("[role='dialog'] button", "Continue"))
            .labelled("dialog continue"),
        LocatorStrategy::click(Query::css(
            "button[aria-label*='close'], button[title*='close'], .close-button",
        ))
        .labelled("close icon"),
        LocatorStrategy::click(Query::css("[role='dialog'] button[class*='close']"))
            .labelled("dialog close"),
        LocatorStrategy::click(Query::css(
            ".modal-backdrop, .overlay, [data-testid*='backdrop']",
        ))
        .labelled("backdrop"),
    ]
}

/// Containers whose visibility means an overlay is still up.
pub fn overlay_containers() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::css(
            "[role='dialog'], .modal, .popup, [class*='modal']",
        ))
        .labelled("dialog container"),
    ]
}

pub fn payout_method() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::text("Bank Direct Deposit")).labelled("method text"),
        LocatorStrategy::click(Query::css_with_text("div", "Bank Direct Deposit"))
            .labelled("method container"),
        LocatorStrategy::click(Query::text("Get paid in 1-3 business days"))
            .labelled("method description"),
        LocatorStrategy::click(Query::css("input[type='radio'][value='ach']"))
            .forced()
            .labelled("hidden ach radio"),
        LocatorStrategy::click(Query::css("*:has(> input[value='ach'])"))
            .labelled("ach option container"),
    ]
}

pub fn continue_button() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::css_with_text("button.btn.btn--primary", "Continue"))
            .labelled("primary continue"),
        LocatorStrategy::click(Query::role("button", "continue")).labelled("continue role"),
        LocatorStrategy::click(Query::css_with_text("button", "continue"))
            .labelled("any continue button"),
    ]
}

pub fn redeem_button() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(Query::css(
            "button[data-et-name='confirm_redeem'][data-et-prop-content='ach'].btn.btn--primary",
        ))
        .labelled("tracked redeem"),
        LocatorStrategy::click(Query::role("button", "redeem")).labelled("redeem role"),
        LocatorStrategy::click(Query::css_with_text("button", "redeem"))
            .labelled("any redeem button"),
        LocatorStrategy::click(Query::css_with_text("button.btn--primary", "Redeem"))
            .labelled("primary redeem"),
    ]
}
