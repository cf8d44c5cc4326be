pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader, apply_env_overrides, validate};
pub use schema::{
    ArtifactConfig, AutoRedeemConfig, BrowserConfig, DelayConfig, OverlayConfig, SiteConfig,
    TimeoutConfig, TransferConfig,
};
