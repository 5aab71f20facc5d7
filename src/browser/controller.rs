//! Launching Chrome and opening the list to harvest
//!
//! A harvest needs one tab that stays alive for the whole session. The
//! controller owns the browser process and its CDP event pump; [`PageHandle`]
//! is the tab the engine drives through [`PageDriver`].

use super::driver::PageDriver;
use crate::error::{BrowserError, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Keeps lazy loaders and timers running when the tab is not focused
const HARVEST_ARGS: &[&str] = &[
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
];

/// How Chrome is launched for a harvest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a window (default: true)
    pub headless: bool,
    /// Viewport width in CSS pixels (default: 1280)
    pub viewport_width: u32,
    /// Viewport height in CSS pixels; taller renders more rows per scroll
    /// (default: 1600)
    pub viewport_height: u32,
    /// Keep the Chrome sandbox on (default: true)
    pub sandbox: bool,
    /// Chrome/Chromium binary; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    /// Profile directory to reuse, e.g. one that is already signed in
    pub profile_dir: Option<PathBuf>,
    /// Budget for opening the target (default: 30000)
    pub load_timeout_ms: u64,
    /// Network quiet period awaited after the load; 0 skips it (default: 500)
    pub settle_idle_ms: u64,
    /// Passed to Chrome after the built-in arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 1600,
            sandbox: true,
            chrome_path: None,
            profile_dir: None,
            load_timeout_ms: 30_000,
            settle_idle_ms: 500,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Command-line switches handed to Chrome
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = HARVEST_ARGS.iter().map(|a| a.to_string()).collect();
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Budget for opening the target
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    fn to_cdp(&self) -> Result<CdpBrowserConfig> {
        let mut builder = CdpBrowserConfig::builder()
            .viewport(Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: self.viewport_width > self.viewport_height,
                has_touch: false,
            })
            .args(self.launch_args());
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(dir) = &self.profile_dir {
            builder = builder.user_data_dir(dir);
        }
        builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e).into())
    }
}

/// The tab being harvested
///
/// Implements [`PageDriver`] over CDP.
#[derive(Clone)]
pub struct PageHandle {
    pub(crate) page: Page,
}

/// Check that a harvest target is something a tab can open
pub fn validate_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| BrowserError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        other => Err(BrowserError::InvalidUrl(format!(
            "unsupported scheme '{other}' in {raw}"
        ))
        .into()),
    }
}

/// Owns the Chrome process for one harvest
pub struct BrowserController {
    browser: Browser,
    events: JoinHandle<()>,
    load_timeout: Duration,
    settle_idle: Duration,
}

impl BrowserController {
    /// Start Chrome and its CDP event pump
    #[instrument(skip(config), fields(headless = config.headless))]
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let (browser, mut handler) = Browser::launch(config.to_cdp()?)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP event pump stopped: {}", e);
                    break;
                }
            }
        });

        info!(
            "Chrome up ({}x{} viewport)",
            config.viewport_width, config.viewport_height
        );
        Ok(Self {
            browser,
            events,
            load_timeout: config.load_timeout(),
            settle_idle: Duration::from_millis(config.settle_idle_ms),
        })
    }

    /// Open the list at `url` and let its first batch render
    #[instrument(skip(self))]
    pub async fn open(&self, url: &str) -> Result<PageHandle> {
        let target = validate_target(url)?;

        let page = tokio::time::timeout(self.load_timeout, async {
            let page = self
                .browser
                .new_page(target.as_str())
                .await
                .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;
            page.wait_for_navigation().await?;
            Ok::<_, Error>(page)
        })
        .await
        .map_err(|_| BrowserError::Timeout(self.load_timeout.as_millis() as u64))??;

        let handle = PageHandle { page };
        if !self.settle_idle.is_zero() {
            match handle
                .wait_for_network_idle(self.settle_idle, self.load_timeout)
                .await
            {
                Ok(true) => debug!("{} settled", target),
                Ok(false) => debug!("{} still loading, harvesting anyway", target),
                Err(e) => debug!("Settle check on {} failed: {}", target, e),
            }
        }
        Ok(handle)
    }

    /// Shut Chrome down and wait briefly for the event pump to drain
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;
        if tokio::time::timeout(Duration::from_secs(5), self.events)
            .await
            .is_err()
        {
            debug!("CDP event pump did not drain in time");
        }
        info!("Chrome closed");
        Ok(())
    }
}
