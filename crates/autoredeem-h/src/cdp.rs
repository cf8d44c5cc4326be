use autoredeem_engine::config::BrowserConfig as BrowserSettings;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Overrides the configured Chrome binary.
pub const ENV_CHROME_BIN: &str = "CHROME_BIN";

/// Flags that keep the profile looking like an ordinary desktop session.
const CHROME_ARGS: [&str; 4] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
];

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
}

impl CdpClient {
    pub async fn launch(
        settings: &BrowserSettings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut config_builder = BrowserConfig::builder();
        config_builder = config_builder.no_sandbox(); // Often needed in docker/CI/restricted envs

        std::fs::create_dir_all(&settings.user_data_dir)?;
        tracing::info!("Using profile: {}", settings.user_data_dir.display());
        config_builder = config_builder.user_data_dir(&settings.user_data_dir);

        if settings.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        }

        if let Some(chrome_bin) = chrome_executable(settings) {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        config_builder = config_builder
            .window_size(settings.window_width, settings.window_height)
            .viewport(None);
        for arg in CHROME_ARGS {
            config_builder = config_builder.arg(arg);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                    continue;
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

        tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let args_str: Vec<String> = event
                    .args
                    .iter()
                    .map(|arg| {
                        arg.description
                            .clone()
                            .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                            .unwrap_or_else(|| "unknown".to_string())
                    })
                    .collect();
                tracing::debug!(
                    "Browser Console [{:?}]: {}",
                    event.r#type,
                    args_str.join(" ")
                );
            }
        });

        // Dialogs block the JS thread, so accept them as they appear.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

        let page_clone = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!(
                    "Accepting JavaScript dialog: {} ({:?})",
                    event.message,
                    event.r#type
                );
                if let Err(e) = page_clone
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::warn!("Failed to accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    /// Closes the browser. The profile directory is left in place.
    pub async fn close(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;
        Ok(())
    }
}

fn chrome_executable(settings: &BrowserSettings) -> Option<PathBuf> {
    settings
        .chrome_executable
        .clone()
        .or_else(|| std::env::var_os(ENV_CHROME_BIN).map(PathBuf::from))
}
