//! Harvest configuration
//!
//! Immutable timeouts, selectors, regex sources and thresholds consumed by the
//! engine components. Values are plain data; how they get loaded is up to the
//! caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for one harvesting session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Adaptive wait settings
    pub wait: WaitConfig,
    /// Scroll strategy settings
    pub scroll: ScrollConfig,
    /// Item navigation and dedup settings
    pub navigation: NavigationConfig,
    /// Metadata extraction settings
    pub extraction: ExtractionConfig,
    /// Session loop limits
    pub limits: HarvestLimits,
}

impl HarvestConfig {
    /// Create a new config builder
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }
}

/// Settings for [`crate::wait::ConditionWaiter`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Budget used until an operation has enough samples (default: 10000)
    pub default_timeout_ms: u64,
    /// Lower clamp for learned timeouts (default: 500)
    pub min_timeout_ms: u64,
    /// Upper clamp for learned timeouts (default: 60000)
    pub max_timeout_ms: u64,
    /// Delay between predicate polls (default: 100)
    pub poll_interval_ms: u64,
    /// Successful durations kept per operation (default: 100)
    pub sample_window: usize,
    /// Samples required before a learned timeout is used (default: 5)
    pub min_samples: usize,
    /// Percentile of the window used for learning (default: 0.95)
    pub percentile: f64,
    /// Headroom applied on top of the percentile (default: 1.5)
    pub timeout_multiplier: f64,
    /// Selectors that indicate an in-progress load
    pub loading_selectors: Vec<String>,
    /// Fraction of metadata selectors that must yield text (default: 0.6)
    pub metadata_population_ratio: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            min_timeout_ms: 500,
            max_timeout_ms: 60_000,
            poll_interval_ms: 100,
            sample_window: 100,
            min_samples: 5,
            percentile: 0.95,
            timeout_multiplier: 1.5,
            loading_selectors: vec![
                ".loading".to_string(),
                ".spinner".to_string(),
                "[aria-busy=\"true\"]".to_string(),
            ],
            metadata_population_ratio: 0.6,
        }
    }
}

impl WaitConfig {
    /// Default budget as a [`Duration`]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Lower clamp as a [`Duration`]
    pub fn min_timeout(&self) -> Duration {
        Duration::from_millis(self.min_timeout_ms)
    }

    /// Upper clamp as a [`Duration`]
    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms)
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings for [`crate::scroll::StrategySelector`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Selector counting loaded content elements
    pub content_selector: String,
    /// Distance used when a request does not set one (default: 800)
    pub default_max_distance: f64,
    /// Time allowed for new content to render after a scroll (default: 3000)
    pub settle_timeout_ms: u64,
    /// Score assigned to strategies without history (default: 0.5)
    pub prior_score: f64,
    /// Weight of the newest sample in smoothed averages (default: 0.3)
    pub smoothing: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            content_selector: "[data-testid=\"virtuoso-item-list\"] > div".to_string(),
            default_max_distance: 800.0,
            settle_timeout_ms: 3_000,
            prior_score: 0.5,
            smoothing: 0.3,
        }
    }
}

impl ScrollConfig {
    /// Settle timeout as a [`Duration`]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Settings for [`crate::navigation::NavigationTracker`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Selector matching every harvestable item
    pub item_selector: String,
    /// Selector matching items currently marked active
    pub active_selector: String,
    /// Element clicked to clear every active item
    pub neutral_selector: String,
    /// Attribute hashed into the fingerprint
    pub class_attribute: String,
    /// Class tokens that only reflect UI state and are left out of fingerprints
    pub volatile_classes: Vec<String>,
    /// Height of one vertical position bucket in pixels (default: 50)
    pub position_bucket_px: f64,
    /// Trailing history length checked for cycles (default: 5)
    pub cycle_window: usize,
    /// Text similarity treated as duplicate (default: 0.9)
    pub similarity_threshold: f64,
    /// Pause after the neutral deselect click (default: 300)
    pub deselect_settle_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            item_selector: "[data-testid=\"virtuoso-item-list\"] > div".to_string(),
            active_selector: "[data-testid=\"virtuoso-item-list\"] > div[aria-selected=\"true\"]"
                .to_string(),
            neutral_selector: "body".to_string(),
            class_attribute: "class".to_string(),
            volatile_classes: ["active", "selected", "focused", "hover"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            position_bucket_px: 50.0,
            cycle_window: 5,
            similarity_threshold: 0.9,
            deselect_settle_ms: 300,
        }
    }
}

impl NavigationConfig {
    /// Deselect pause as a [`Duration`]
    pub fn deselect_settle(&self) -> Duration {
        Duration::from_millis(self.deselect_settle_ms)
    }
}

/// One labeled timestamp regex; the first capture group (or the whole match)
/// is the timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampPattern {
    /// Label used in logs and errors
    pub name: String,
    /// Regex source
    pub pattern: String,
}

impl TimestampPattern {
    /// Create a labeled pattern
    pub fn new<N: Into<String>, P: Into<String>>(name: N, pattern: P) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Settings for [`crate::extraction::ContentExtractor`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timestamp patterns, most specific first
    pub timestamp_patterns: Vec<TimestampPattern>,
    /// Require captured timestamps to match `canonical_datetime`
    pub strict_validation: bool,
    /// Shape a captured timestamp must have under strict validation
    pub canonical_datetime: String,
    /// Shortest accepted prompt line in characters (default: 10)
    pub min_prompt_len: usize,
    /// Longest accepted prompt line in characters (default: 2000)
    pub max_prompt_len: usize,
    /// Lines matching this are UI chrome, not descriptions
    pub noise_pattern: String,
    /// Lines matching this carry no words
    pub symbol_only_pattern: String,
    /// Minimum whitespace-separated tokens in a prompt line (default: 3)
    pub min_words: usize,
    /// Inputs shorter than this are rejected outright (default: 10)
    pub min_input_len: usize,
    /// Characters past this are ignored (default: 20000)
    pub max_input_len: usize,
    /// Landmark label used for the DOM fallback
    pub timestamp_landmark: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timestamp_patterns: crate::extraction::patterns::default_timestamp_patterns(),
            strict_validation: true,
            canonical_datetime: crate::extraction::patterns::CANONICAL_DATETIME.to_string(),
            min_prompt_len: 10,
            max_prompt_len: 2000,
            noise_pattern: crate::extraction::patterns::DEFAULT_NOISE.to_string(),
            symbol_only_pattern: crate::extraction::patterns::SYMBOL_ONLY.to_string(),
            min_words: 3,
            min_input_len: 10,
            max_input_len: 20_000,
            timestamp_landmark: "Creation Time".to_string(),
        }
    }
}

/// Limits for [`crate::harvest::HarvestSession`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestLimits {
    /// Stop after this many items (default: 100)
    pub max_items: usize,
    /// Stop after this many scrolls in a row yield nothing new (default: 3)
    pub max_empty_loads: usize,
    /// Upper bound of the random pause between items (default: 250)
    pub pacing_jitter_ms: u64,
    /// Skip recording items classified as duplicates (default: true)
    pub skip_duplicates: bool,
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self {
            max_items: 100,
            max_empty_loads: 3,
            pacing_jitter_ms: 250,
            skip_duplicates: true,
        }
    }
}

/// Builder for HarvestConfig
#[derive(Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    /// Set the item selector, also used to count loaded content
    pub fn item_selector<S: Into<String>>(mut self, selector: S) -> Self {
        let selector = selector.into();
        self.config.scroll.content_selector = selector.clone();
        self.config.navigation.item_selector = selector;
        self
    }

    /// Set the active item selector
    pub fn active_selector<S: Into<String>>(mut self, selector: S) -> Self {
        self.config.navigation.active_selector = selector.into();
        self
    }

    /// Set the neutral deselect target
    pub fn neutral_selector<S: Into<String>>(mut self, selector: S) -> Self {
        self.config.navigation.neutral_selector = selector.into();
        self
    }

    /// Set the default wait budget
    pub fn default_timeout_ms(mut self, ms: u64) -> Self {
        self.config.wait.default_timeout_ms = ms;
        self
    }

    /// Set the learned timeout clamp
    pub fn timeout_bounds_ms(mut self, min: u64, max: u64) -> Self {
        self.config.wait.min_timeout_ms = min;
        self.config.wait.max_timeout_ms = max;
        self
    }

    /// Set the poll interval
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.wait.poll_interval_ms = ms;
        self
    }

    /// Set the post-scroll settle timeout
    pub fn settle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.scroll.settle_timeout_ms = ms;
        self
    }

    /// Enable/disable strict timestamp validation
    pub fn strict_validation(mut self, strict: bool) -> Self {
        self.config.extraction.strict_validation = strict;
        self
    }

    /// Set the item limit
    pub fn max_items(mut self, max: usize) -> Self {
        self.config.limits.max_items = max;
        self
    }

    /// Set the empty-load limit
    pub fn max_empty_loads(mut self, max: usize) -> Self {
        self.config.limits.max_empty_loads = max;
        self
    }

    /// Set the pacing jitter upper bound
    pub fn pacing_jitter_ms(mut self, ms: u64) -> Self {
        self.config.limits.pacing_jitter_ms = ms;
        self
    }

    /// Build the config
    pub fn build(self) -> HarvestConfig {
        self.config
    }
}
