//! Forward-only navigation over the rendered item list

use super::fingerprint::{fingerprint_element, Fingerprint};
use super::similarity::positional_similarity;
use crate::browser::PageDriver;
use crate::config::NavigationConfig;
use crate::extraction::ExtractedMetadata;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};

/// Last known content of a processed item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Timestamp as shown on the page
    pub creation_time: String,
    /// Descriptive text
    pub prompt: String,
}

impl MetadataRecord {
    /// Create a record
    pub fn new<T: Into<String>, P: Into<String>>(creation_time: T, prompt: P) -> Self {
        Self {
            creation_time: creation_time.into(),
            prompt: prompt.into(),
        }
    }

    /// Both fields carry text
    pub fn is_complete(&self) -> bool {
        !self.creation_time.trim().is_empty() && !self.prompt.trim().is_empty()
    }
}

impl From<&ExtractedMetadata> for MetadataRecord {
    fn from(meta: &ExtractedMetadata) -> Self {
        Self::new(meta.creation_time.clone(), meta.prompt.clone())
    }
}

/// Result of one navigation step
#[derive(Debug, Clone)]
pub enum NavigationOutcome<E> {
    /// A new item is active and already counted as processed
    Advanced {
        /// Identifier of the new item
        fingerprint: Fingerprint,
        /// Handle of the new item
        element: E,
    },
    /// The current item keeps coming back; the caller should stop
    CycleDetected(Fingerprint),
    /// Every rendered item is processed; load more and retry
    Exhausted,
    /// The page could not be queried or driven
    Failed(String),
}

impl<E> NavigationOutcome<E> {
    /// Whether the step advanced
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }

    /// Fingerprint carried by the outcome, if any
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Self::Advanced { fingerprint, .. } | Self::CycleDetected(fingerprint) => {
                Some(fingerprint)
            }
            Self::Exhausted | Self::Failed(_) => None,
        }
    }
}

/// Duplicate classification of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    /// Candidate repeats a processed item
    pub is_duplicate: bool,
    /// Human-readable reason
    pub reason: String,
    /// Item it repeats
    pub matched: Option<Fingerprint>,
}

impl DuplicateCheck {
    fn unique(reason: &str) -> Self {
        Self {
            is_duplicate: false,
            reason: reason.to_string(),
            matched: None,
        }
    }

    fn duplicate(kind: &str, matched: &Fingerprint) -> Self {
        Self {
            is_duplicate: true,
            reason: format!("{kind} with {matched}"),
            matched: Some(matched.clone()),
        }
    }
}

/// Snapshot of navigation state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationStats {
    /// Items in the processed set
    pub processed: usize,
    /// Items with recorded metadata
    pub metadata_records: usize,
    /// Trailing history, oldest first
    pub recent_history: Vec<Fingerprint>,
    /// Successful navigation steps
    pub navigations: u64,
    /// Steps refused as cycles
    pub cycles_detected: u64,
    /// Steps that found nothing new
    pub exhausted: u64,
    /// Multi-active anomalies repaired
    pub multi_active_repairs: u64,
    /// DOM calls that failed and were skipped
    pub dom_failures: u64,
    /// Candidates classified as duplicates
    pub duplicates_detected: u64,
}

#[derive(Debug, Default)]
struct Counters {
    navigations: u64,
    cycles_detected: u64,
    exhausted: u64,
    multi_active_repairs: u64,
    dom_failures: u64,
    duplicates_detected: u64,
}

/// Keeps track of which items were visited and in which order
///
/// Items move from unvisited to active to processed. The tracker never hands
/// out a fingerprint twice until [`NavigationTracker::reset_navigation_state`]
/// is called.
#[derive(Debug)]
pub struct NavigationTracker {
    config: NavigationConfig,
    processed: HashSet<Fingerprint>,
    history: VecDeque<Fingerprint>,
    metadata: BTreeMap<Fingerprint, MetadataRecord>,
    counters: Counters,
}

impl Default for NavigationTracker {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

impl NavigationTracker {
    /// Create a tracker with empty state
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.cycle_window.max(1)),
            config,
            processed: HashSet::new(),
            metadata: BTreeMap::new(),
            counters: Counters::default(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Whether a fingerprint was already processed
    pub fn is_processed(&self, fingerprint: &Fingerprint) -> bool {
        self.processed.contains(fingerprint)
    }

    /// The one active item, repairing the page if several are active
    #[instrument(skip(self, page))]
    pub async fn get_single_active_item<P: PageDriver>(&mut self, page: &P) -> Option<P::Element> {
        let active = match page.query_all(&self.config.active_selector).await {
            Ok(active) => active,
            Err(e) => {
                debug!("Active item query failed: {}", e);
                self.counters.dom_failures += 1;
                return None;
            }
        };

        match active.len() {
            0 => None,
            1 => active.into_iter().next(),
            n => {
                warn!("{} items are active at once, deselecting", n);
                self.counters.multi_active_repairs += 1;
                self.repair_multi_active(page, active).await
            }
        }
    }

    async fn repair_multi_active<P: PageDriver>(
        &mut self,
        page: &P,
        previously_active: Vec<P::Element>,
    ) -> Option<P::Element> {
        match page.query(&self.config.neutral_selector).await {
            Ok(Some(neutral)) => {
                if let Err(e) = page.click(&neutral).await {
                    debug!("Neutral click failed: {}", e);
                    self.counters.dom_failures += 1;
                }
            }
            Ok(None) => debug!("Neutral element {} not found", self.config.neutral_selector),
            Err(e) => {
                debug!("Neutral element query failed: {}", e);
                self.counters.dom_failures += 1;
            }
        }

        tokio::time::sleep(self.config.deselect_settle()).await;

        let candidates = match page.query_all(&self.config.active_selector).await {
            Ok(mut still_active) if still_active.len() == 1 => return still_active.pop(),
            Ok(still_active) if !still_active.is_empty() => still_active,
            Ok(_) => previously_active,
            Err(e) => {
                debug!("Active item re-query failed: {}", e);
                self.counters.dom_failures += 1;
                previously_active
            }
        };

        let mut visible = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !page.is_visible(&candidate).await.unwrap_or(false) {
                continue;
            }
            if let Ok(Some(bbox)) = page.bounding_box(&candidate).await {
                visible.push((bbox.y, candidate));
            }
        }
        visible.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (_, chosen) = visible.into_iter().next()?;
        match page.click(&chosen).await {
            Ok(()) => Some(chosen),
            Err(e) => {
                debug!("Reactivating item failed: {}", e);
                self.counters.dom_failures += 1;
                None
            }
        }
    }

    /// Move to the first unprocessed item at or after the active one
    ///
    /// An active item that was never processed is returned as is. The
    /// returned fingerprint is inserted into the processed set before
    /// returning, so repeated calls always make forward progress. The active
    /// item enters the history whenever it differs from the last entry, so a
    /// host that keeps snapping back to one item is refused on its second
    /// repeat.
    #[instrument(skip(self, page))]
    pub async fn navigate_to_next_unprocessed<P: PageDriver>(
        &mut self,
        page: &P,
    ) -> NavigationOutcome<P::Element> {
        let current = self.get_single_active_item(page).await;
        let current_fp = match &current {
            Some(element) => fingerprint_element(page, element, &self.config).await,
            None => None,
        };

        if let Some(fp) = &current_fp {
            if self.would_cycle(fp) {
                warn!("Item {} keeps coming back, refusing to navigate", fp);
                self.counters.cycles_detected += 1;
                return NavigationOutcome::CycleDetected(fp.clone());
            }
            // the host may have moved the selection back on its own
            if self.history.back() != Some(fp) {
                self.push_history(fp.clone());
            }
        }

        let items = match page.query_all(&self.config.item_selector).await {
            Ok(items) => items,
            Err(e) => {
                self.counters.dom_failures += 1;
                return NavigationOutcome::Failed(e.to_string());
            }
        };

        let mut fingerprinted = Vec::with_capacity(items.len());
        for item in items {
            match fingerprint_element(page, &item, &self.config).await {
                Some(fp) => fingerprinted.push((fp, item)),
                None => self.counters.dom_failures += 1,
            }
        }

        let start = current_fp
            .as_ref()
            .and_then(|current| fingerprinted.iter().position(|(fp, _)| fp == current))
            .unwrap_or(0);

        let Some((fingerprint, element)) = fingerprinted
            .into_iter()
            .skip(start)
            .find(|(fp, _)| !self.processed.contains(fp))
        else {
            debug!("No unprocessed item among rendered items");
            self.counters.exhausted += 1;
            return NavigationOutcome::Exhausted;
        };

        let already_active = current_fp.as_ref() == Some(&fingerprint);
        if current.is_some() && !already_active {
            if let Ok(Some(neutral)) = page.query(&self.config.neutral_selector).await {
                if let Err(e) = page.click(&neutral).await {
                    debug!("Deactivating current item failed: {}", e);
                    self.counters.dom_failures += 1;
                }
            }
        }

        if let Err(e) = page.scroll_into_view(&element).await {
            debug!("Scrolling item {} into view failed: {}", fingerprint, e);
        }
        if !already_active {
            if let Err(e) = page.click(&element).await {
                self.counters.dom_failures += 1;
                return NavigationOutcome::Failed(format!("activating {fingerprint}: {e}"));
            }
        }

        self.processed.insert(fingerprint.clone());
        if self.history.back() != Some(&fingerprint) {
            self.push_history(fingerprint.clone());
        }
        self.counters.navigations += 1;
        info!("Navigated to item {}", fingerprint);

        NavigationOutcome::Advanced {
            fingerprint,
            element,
        }
    }

    /// Whether visiting `fingerprint` again would be a cycle
    pub fn would_cycle(&self, fingerprint: &Fingerprint) -> bool {
        self.history.iter().filter(|fp| *fp == fingerprint).count() >= 2
    }

    /// Append to history unless it would be a cycle; returns whether it was
    /// accepted
    pub fn record_navigation(&mut self, fingerprint: Fingerprint) -> bool {
        if self.would_cycle(&fingerprint) {
            self.counters.cycles_detected += 1;
            return false;
        }
        self.push_history(fingerprint);
        true
    }

    fn push_history(&mut self, fingerprint: Fingerprint) {
        let window = self.config.cycle_window.max(1);
        while self.history.len() >= window {
            self.history.pop_front();
        }
        self.history.push_back(fingerprint);
    }

    /// Record an item as processed with its content
    pub fn mark_processed(&mut self, fingerprint: Fingerprint, metadata: Option<MetadataRecord>) {
        if let Some(record) = metadata {
            self.metadata.insert(fingerprint.clone(), record);
        }
        self.processed.insert(fingerprint);
    }

    /// Whether `candidate` repeats the content of a processed item
    ///
    /// A matching timestamp alone is never enough; the text must match too.
    pub fn is_content_duplicate(&mut self, candidate: &MetadataRecord) -> DuplicateCheck {
        if !candidate.is_complete() {
            return DuplicateCheck::unique("Incomplete metadata");
        }

        let same_time = self
            .metadata
            .iter()
            .filter(|(_, record)| record.creation_time == candidate.creation_time);

        let mut similar = None;
        for (fp, record) in same_time {
            if record.prompt == candidate.prompt {
                self.counters.duplicates_detected += 1;
                return DuplicateCheck::duplicate("Exact match", fp);
            }
            if similar.is_none()
                && positional_similarity(&candidate.prompt, &record.prompt)
                    >= self.config.similarity_threshold
            {
                similar = Some(fp);
            }
        }

        match similar {
            Some(fp) => {
                self.counters.duplicates_detected += 1;
                DuplicateCheck::duplicate("High similarity", fp)
            }
            None => DuplicateCheck::unique("No duplicates found"),
        }
    }

    /// Snapshot of the current state
    pub fn get_navigation_stats(&self) -> NavigationStats {
        NavigationStats {
            processed: self.processed.len(),
            metadata_records: self.metadata.len(),
            recent_history: self.history.iter().cloned().collect(),
            navigations: self.counters.navigations,
            cycles_detected: self.counters.cycles_detected,
            exhausted: self.counters.exhausted,
            multi_active_repairs: self.counters.multi_active_repairs,
            dom_failures: self.counters.dom_failures,
            duplicates_detected: self.counters.duplicates_detected,
        }
    }

    /// Forget processed items, history, metadata and counters
    pub fn reset_navigation_state(&mut self) {
        self.processed.clear();
        self.history.clear();
        self.metadata.clear();
        self.counters = Counters::default();
    }
}
