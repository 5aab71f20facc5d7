//! Download capability
//!
//! Triggering a download is a separate capability the session may or may not
//! hold. Where the file ends up is the browser's business.

use crate::browser::PageDriver;
use crate::wait::ConditionWaiter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Outcome of one download attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// The download was triggered
    pub success: bool,
    /// Time from start to click, in milliseconds
    pub duration_ms: u64,
    /// Why it was not triggered
    pub error: Option<String>,
}

impl DownloadOutcome {
    fn succeeded(started: Instant) -> Self {
        Self {
            success: true,
            duration_ms: started.elapsed().as_millis() as u64,
            error: None,
        }
    }

    fn failed<S: Into<String>>(started: Instant, error: S) -> Self {
        Self {
            success: false,
            duration_ms: started.elapsed().as_millis() as u64,
            error: Some(error.into()),
        }
    }
}

/// Something that can download the active item
#[async_trait]
pub trait DownloadAction<P: PageDriver>: Send + Sync {
    /// Trigger a download for `item`
    async fn download(
        &self,
        page: &P,
        item: &P::Element,
        waiter: &ConditionWaiter,
    ) -> DownloadOutcome;
}

/// Downloads by clicking a button once it is ready
#[derive(Debug, Clone)]
pub struct ButtonDownload {
    button_selector: String,
    ready_timeout: Option<Duration>,
    hover_item: bool,
}

impl ButtonDownload {
    /// Click `button_selector`; the ready wait uses the learned budget
    pub fn new<S: Into<String>>(button_selector: S) -> Self {
        Self {
            button_selector: button_selector.into(),
            ready_timeout: None,
            hover_item: true,
        }
    }

    /// Fix the ready wait budget instead of learning it
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    /// Whether to hover the item first to reveal its controls (default: true)
    pub fn hover_item(mut self, hover: bool) -> Self {
        self.hover_item = hover;
        self
    }

    /// Selector of the button
    pub fn button_selector(&self) -> &str {
        &self.button_selector
    }
}

#[async_trait]
impl<P: PageDriver> DownloadAction<P> for ButtonDownload {
    #[instrument(skip(self, page, item, waiter), fields(button = %self.button_selector))]
    async fn download(
        &self,
        page: &P,
        item: &P::Element,
        waiter: &ConditionWaiter,
    ) -> DownloadOutcome {
        let started = Instant::now();

        if self.hover_item {
            if let Err(e) = page.hover(item).await {
                debug!("Hovering item before download failed: {}", e);
            }
        }

        let ready = waiter
            .wait_for_download_ready(page, &self.button_selector, self.ready_timeout)
            .await;
        let Some(button) = ready.result else {
            let reason = ready
                .error
                .unwrap_or_else(|| format!("button not ready within {:?}", ready.timeout_used));
            return DownloadOutcome::failed(started, reason);
        };

        match page.click(&button).await {
            Ok(()) => {
                info!("Download triggered in {:?}", started.elapsed());
                DownloadOutcome::succeeded(started)
            }
            Err(e) => DownloadOutcome::failed(started, e.to_string()),
        }
    }
}
