use crate::money::Amount;
use crate::overlay::DismissPolicy;
use crate::retention::RetentionPolicy;
use crate::strategies::StrategyTables;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoRedeemConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub delays: DelayConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub strategies: StrategyTables,
}

impl AutoRedeemConfig {
    pub fn dismiss_policy(&self) -> DismissPolicy {
        DismissPolicy {
            max_attempts: self.overlay.max_attempts,
            settle_delay: self.delays.overlay_settle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_payout_url")]
    pub payout_url: String,
    /// URL fragment that marks the login page.
    #[serde(default = "default_login_url_token")]
    pub login_url_token: String,
    /// Text that identifies the confirmation page.
    #[serde(default = "default_confirmation_text")]
    pub confirmation_text: String,
    #[serde(default = "default_confirmation_url_token")]
    pub confirmation_url_token: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            payout_url: default_payout_url(),
            login_url_token: default_login_url_token(),
            confirmation_text: default_confirmation_text(),
            confirmation_url_token: default_confirmation_url_token(),
        }
    }
}

fn default_payout_url() -> String {
    "https://poshmark.com/account/payout-options".to_string()
}

fn default_login_url_token() -> String {
    "login".to_string()
}

fn default_confirmation_text() -> String {
    "confirm redeem".to_string()
}

fn default_confirmation_url_token() -> String {
    "confirm_redeem".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Balance at or above which a transfer is started.
    #[serde(default = "default_min_transfer")]
    pub min_transfer: Amount,
    /// Balance assumed when none can be parsed from the page.
    #[serde(default = "default_unparsed_balance")]
    pub unparsed_balance: Amount,
    /// Fail instead of warning when the confirmation page is not recognized.
    #[serde(default)]
    pub strict_confirmation: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_transfer: default_min_transfer(),
            unparsed_balance: default_unparsed_balance(),
            strict_confirmation: false,
        }
    }
}

fn default_min_transfer() -> Amount {
    Amount::from_cents(500)
}

fn default_unparsed_balance() -> Amount {
    Amount::from_cents(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Persistent profile so the site session survives between runs.
    #[serde(default = "default_user_data_dir")]
    pub user_data_dir: PathBuf,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            user_data_dir: default_user_data_dir(),
            chrome_executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_user_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("posh-bot-profile"),
        None => PathBuf::from("./posh-bot-profile"),
    }
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    900
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_navigation_secs")]
    pub navigation_secs: u64,
    #[serde(default = "default_network_idle_secs")]
    pub network_idle_secs: u64,
    #[serde(default = "default_login_idle_secs")]
    pub login_idle_secs: u64,
    /// How long to wait for loading spinners to go away.
    #[serde(default = "default_loading_secs")]
    pub loading_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_secs: default_navigation_secs(),
            network_idle_secs: default_network_idle_secs(),
            login_idle_secs: default_login_idle_secs(),
            loading_secs: default_loading_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_secs(self.network_idle_secs)
    }

    pub fn login_idle(&self) -> Duration {
        Duration::from_secs(self.login_idle_secs)
    }

    pub fn loading(&self) -> Duration {
        Duration::from_secs(self.loading_secs)
    }
}

fn default_navigation_secs() -> u64 {
    60
}

fn default_network_idle_secs() -> u64 {
    30
}

fn default_login_idle_secs() -> u64 {
    45
}

fn default_loading_secs() -> u64 {
    30
}

/// Fixed pauses that let the page settle between steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    #[serde(default = "default_overlay_settle_ms")]
    pub overlay_settle_ms: u64,
    #[serde(default = "default_post_login_ms")]
    pub post_login_ms: u64,
    #[serde(default = "default_post_selection_ms")]
    pub post_selection_ms: u64,
    #[serde(default = "default_confirmation_ms")]
    pub confirmation_ms: u64,
    #[serde(default = "default_post_redeem_ms")]
    pub post_redeem_ms: u64,
    /// Pause before the browser is closed at the end of a run.
    #[serde(default = "default_before_close_ms")]
    pub before_close_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            overlay_settle_ms: default_overlay_settle_ms(),
            post_login_ms: default_post_login_ms(),
            post_selection_ms: default_post_selection_ms(),
            confirmation_ms: default_confirmation_ms(),
            post_redeem_ms: default_post_redeem_ms(),
            before_close_ms: default_before_close_ms(),
        }
    }
}

impl DelayConfig {
    /// All pauses zeroed. Used when driving a scripted backend.
    pub fn none() -> Self {
        Self {
            overlay_settle_ms: 0,
            post_login_ms: 0,
            post_selection_ms: 0,
            confirmation_ms: 0,
            post_redeem_ms: 0,
            before_close_ms: 0,
        }
    }

    pub fn overlay_settle(&self) -> Duration {
        Duration::from_millis(self.overlay_settle_ms)
    }

    pub fn post_login(&self) -> Duration {
        Duration::from_millis(self.post_login_ms)
    }

    pub fn post_selection(&self) -> Duration {
        Duration::from_millis(self.post_selection_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }

    pub fn post_redeem(&self) -> Duration {
        Duration::from_millis(self.post_redeem_ms)
    }

    pub fn before_close(&self) -> Duration {
        Duration::from_millis(self.before_close_ms)
    }
}

fn default_overlay_settle_ms() -> u64 {
    1000
}

fn default_post_login_ms() -> u64 {
    3000
}

fn default_post_selection_ms() -> u64 {
    2000
}

fn default_confirmation_ms() -> u64 {
    5000
}

fn default_post_redeem_ms() -> u64 {
    5000
}

fn default_before_close_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> u32 {
    crate::overlay::DEFAULT_MAX_ATTEMPTS
}
