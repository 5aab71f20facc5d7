//! The harvesting loop
//!
//! A session owns one of each engine component and drives them against one
//! page: navigate forward, load more when the rendered list runs out, extract,
//! drop duplicates, optionally download, repeat.

use super::download::{DownloadAction, DownloadOutcome};
use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::error::Result;
use crate::extraction::{ContentExtractor, ExtractedMetadata, LandmarkLocator};
use crate::navigation::{
    DuplicateCheck, Fingerprint, MetadataRecord, NavigationOutcome, NavigationStats,
    NavigationTracker,
};
use crate::scroll::{ScrollReport, ScrollRequest, StrategySelector};
use crate::wait::{ConditionWaiter, PerformanceReport};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The item limit was reached
    MaxItems,
    /// Loading more stopped producing new items
    ContentExhausted,
    /// Navigation kept returning to the same item
    CycleDetected,
    /// The page could not be queried repeatedly
    PageUnavailable,
}

/// One harvested item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedItem {
    /// Session-scoped identifier
    pub fingerprint: Fingerprint,
    /// Extracted content
    pub metadata: ExtractedMetadata,
    /// Set when the item repeats an earlier one and duplicates are kept
    pub duplicate_of: Option<Fingerprint>,
    /// Download outcome, when a download action is configured
    pub download: Option<DownloadOutcome>,
    /// When the item was processed
    pub harvested_at: DateTime<Utc>,
}

/// Download counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Downloads attempted
    pub attempted: u64,
    /// Downloads triggered
    pub succeeded: u64,
}

/// Everything a session produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Session identifier
    pub session_id: Uuid,
    /// When the session was created
    pub started_at: DateTime<Utc>,
    /// When `run` returned
    pub finished_at: DateTime<Utc>,
    /// Why the loop stopped
    pub termination: Termination,
    /// Harvested items in navigation order
    pub items: Vec<HarvestedItem>,
    /// Items skipped as duplicates
    pub duplicates_skipped: u64,
    /// Items without a recoverable timestamp
    pub extraction_failures: u64,
    /// Download counters
    pub downloads: DownloadSummary,
    /// Last navigation failure
    pub last_error: Option<String>,
    /// Wait telemetry
    pub wait: PerformanceReport,
    /// Scroll telemetry
    pub scroll: ScrollReport,
    /// Navigation telemetry
    pub navigation: NavigationStats,
}

#[derive(Debug, Default)]
struct RunState {
    items: Vec<HarvestedItem>,
    duplicates_skipped: u64,
    extraction_failures: u64,
    downloads: DownloadSummary,
    last_error: Option<String>,
}

/// Drives the engine over one page
pub struct HarvestSession<'a, P: PageDriver> {
    page: &'a P,
    config: HarvestConfig,
    waiter: ConditionWaiter,
    selector: StrategySelector,
    tracker: NavigationTracker,
    extractor: ContentExtractor,
    landmarks: LandmarkLocator,
    download: Option<Box<dyn DownloadAction<P>>>,
    id: Uuid,
    started_at: DateTime<Utc>,
}

impl<'a, P: PageDriver> std::fmt::Debug for HarvestSession<'a, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("download", &self.download.is_some())
            .finish()
    }
}

impl<'a, P: PageDriver> HarvestSession<'a, P> {
    /// Create a session with fresh engine state
    ///
    /// Fails only when a configured extraction pattern does not compile.
    pub fn new(page: &'a P, config: HarvestConfig) -> Result<Self> {
        let extractor = ContentExtractor::new(config.extraction.clone())?;
        Ok(Self {
            page,
            waiter: ConditionWaiter::new(config.wait.clone()),
            selector: StrategySelector::new(config.scroll.clone()),
            tracker: NavigationTracker::new(config.navigation.clone()),
            extractor,
            landmarks: LandmarkLocator::new(),
            download: None,
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
        })
    }

    /// Download every harvested item with `action`
    pub fn with_download<D: DownloadAction<P> + 'static>(mut self, action: D) -> Self {
        self.download = Some(Box::new(action));
        self
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration in use
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// The session's waiter
    pub fn waiter(&self) -> &ConditionWaiter {
        &self.waiter
    }

    /// The session's strategy selector
    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// The session's navigation tracker
    pub fn tracker(&self) -> &NavigationTracker {
        &self.tracker
    }

    /// Harvest until a limit is hit or nothing new appears
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn run(&mut self) -> HarvestReport {
        let limits = self.config.limits.clone();
        let request = ScrollRequest::new(self.config.scroll.default_max_distance).expect(1);

        let mut state = RunState::default();
        let mut empty_loads = 0usize;
        let mut failures = 0usize;

        info!("Harvest session {} started", self.id);

        let termination = loop {
            if state.items.len() >= limits.max_items {
                break Termination::MaxItems;
            }

            match self.tracker.navigate_to_next_unprocessed(self.page).await {
                NavigationOutcome::Advanced {
                    fingerprint,
                    element,
                } => {
                    empty_loads = 0;
                    failures = 0;
                    self.process_item(fingerprint, &element, &mut state).await;
                    self.pace(limits.pacing_jitter_ms).await;
                }
                NavigationOutcome::Exhausted => {
                    if empty_loads >= limits.max_empty_loads {
                        break Termination::ContentExhausted;
                    }
                    empty_loads += 1;
                    let scroll = self
                        .selector
                        .scroll_to_load_content(self.page, &self.waiter, &request)
                        .await;
                    debug!(
                        "Load attempt {} of {}: success={}, delta={}",
                        empty_loads, limits.max_empty_loads, scroll.success, scroll.content_delta
                    );
                }
                NavigationOutcome::CycleDetected(fp) => {
                    warn!("Stopping: navigation cycles on {}", fp);
                    break Termination::CycleDetected;
                }
                NavigationOutcome::Failed(message) => {
                    warn!("Navigation failed: {}", message);
                    state.last_error = Some(message);
                    failures += 1;
                    if failures > limits.max_empty_loads {
                        break Termination::PageUnavailable;
                    }
                }
            }
        };

        info!(
            "Harvest session {} finished ({:?}): {} items, {} duplicates, {} extraction failures",
            self.id,
            termination,
            state.items.len(),
            state.duplicates_skipped,
            state.extraction_failures
        );

        HarvestReport {
            session_id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            termination,
            items: state.items,
            duplicates_skipped: state.duplicates_skipped,
            extraction_failures: state.extraction_failures,
            downloads: state.downloads,
            last_error: state.last_error,
            wait: self.waiter.get_performance_report(),
            scroll: self.selector.get_performance_report(),
            navigation: self.tracker.get_navigation_stats(),
        }
    }

    async fn process_item(
        &mut self,
        fingerprint: Fingerprint,
        element: &P::Element,
        state: &mut RunState,
    ) {
        let Some(metadata) = self.extract(element).await else {
            debug!("No timestamp for item {}", fingerprint);
            state.extraction_failures += 1;
            self.tracker.mark_processed(fingerprint, None);
            return;
        };

        let record = MetadataRecord::from(&metadata);
        let DuplicateCheck {
            is_duplicate,
            reason,
            matched,
        } = self.tracker.is_content_duplicate(&record);
        self.tracker.mark_processed(fingerprint.clone(), Some(record));

        if is_duplicate {
            state.duplicates_skipped += 1;
            debug!("Item {}: {}", fingerprint, reason);
            if self.config.limits.skip_duplicates {
                return;
            }
        }

        let download = match &self.download {
            Some(action) => {
                let outcome = action.download(self.page, element, &self.waiter).await;
                state.downloads.attempted += 1;
                if outcome.success {
                    state.downloads.succeeded += 1;
                } else {
                    warn!("Download for {} failed: {:?}", fingerprint, outcome.error);
                }
                Some(outcome)
            }
            None => None,
        };

        state.items.push(HarvestedItem {
            fingerprint,
            metadata,
            duplicate_of: matched.filter(|_| is_duplicate),
            download,
            harvested_at: Utc::now(),
        });
    }

    async fn extract(&self, element: &P::Element) -> Option<ExtractedMetadata> {
        let text = self.page.inner_text(element).await.ok();
        if let Some(metadata) = text
            .as_deref()
            .and_then(|t| self.extractor.extract_metadata(t))
        {
            return Some(metadata);
        }

        let landmark = &self.config.extraction.timestamp_landmark;
        let value = self.landmarks.value_for(self.page, element, landmark).await?;
        debug!("Timestamp '{}' found beside landmark '{}'", value, landmark);
        Some(
            self.extractor
                .extract_with_timestamp(text.as_deref().unwrap_or_default(), value),
        )
    }

    async fn pace(&self, jitter_ms: u64) {
        if jitter_ms == 0 {
            return;
        }
        let pause = rand::rng().random_range(0..=jitter_ms);
        tokio::time::sleep(Duration::from_millis(pause)).await;
    }
}
