//! Score-ranked strategy selection with ordered fallback

use super::strategy::{ScrollRequest, ScrollStrategy};
use crate::browser::PageDriver;
use crate::config::ScrollConfig;
use crate::wait::ConditionWaiter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

const SUCCESS_WEIGHT: f64 = 0.6;
const SPEED_WEIGHT: f64 = 0.3;
const YIELD_WEIGHT: f64 = 0.1;

/// Learned performance of one strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Attempts that moved the view
    pub successes: u64,
    /// Attempts that errored or did not move
    pub failures: u64,
    /// Smoothed duration of successful attempts, in seconds
    pub avg_duration_secs: f64,
    /// Smoothed number of new elements per successful attempt
    pub avg_yield: f64,
    /// Score as of the last attempt
    pub reliability: f64,
}

impl StrategyStats {
    /// Attempts of either kind
    pub fn attempts(&self) -> u64 {
        self.successes + self.failures
    }

    /// successes / attempts
    pub fn success_rate(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            n => self.successes as f64 / n as f64,
        }
    }

    /// Ranking score; `prior` applies while there is no history
    ///
    /// The speed term only counts once a success has produced a duration,
    /// otherwise a strategy that never worked would look infinitely fast.
    pub fn score(&self, prior: f64) -> f64 {
        if self.attempts() == 0 {
            return prior;
        }
        let speed = if self.successes > 0 {
            1.0 / (self.avg_duration_secs + 0.1)
        } else {
            0.0
        };
        SUCCESS_WEIGHT * self.success_rate()
            + SPEED_WEIGHT * speed
            + YIELD_WEIGHT * (self.avg_yield + 1.0) / 10.0
    }

    fn record_success(&mut self, duration: Duration, content_yield: f64, smoothing: f64, prior: f64) {
        let secs = duration.as_secs_f64();
        if self.successes == 0 {
            self.avg_duration_secs = secs;
            self.avg_yield = content_yield;
        } else {
            self.avg_duration_secs = (1.0 - smoothing) * self.avg_duration_secs + smoothing * secs;
            self.avg_yield = (1.0 - smoothing) * self.avg_yield + smoothing * content_yield;
        }
        self.successes += 1;
        self.reliability = self.score(prior);
    }

    fn record_failure(&mut self, prior: f64) {
        self.failures += 1;
        self.reliability = self.score(prior);
    }
}

/// Outcome of one load-more request
#[derive(Debug, Clone)]
pub struct ScrollResult {
    /// Some strategy moved the view
    pub success: bool,
    /// Strategy that succeeded, or the last one tried
    pub strategy: Option<ScrollStrategy>,
    /// Strategies tried, in order
    pub attempted: Vec<ScrollStrategy>,
    /// Total time spent
    pub duration: Duration,
    /// Content elements before the request
    pub content_before: usize,
    /// Content elements after the request
    pub content_after: usize,
    /// content_after - content_before; negative when a virtualized list
    /// recycled more nodes than it added
    pub content_delta: i64,
    /// Pixels the view moved
    pub distance_scrolled: f64,
    /// Last failure when nothing worked
    pub error: Option<String>,
}

/// Serializable view of one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    /// Strategy
    pub strategy: ScrollStrategy,
    /// Current ranking score
    pub score: f64,
    /// Learned stats
    pub stats: StrategyStats,
}

/// Strategies in current rank order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollReport {
    /// One entry per strategy, best first
    pub strategies: Vec<StrategyReport>,
}

/// Picks how to load more content based on what has worked so far
#[derive(Debug)]
pub struct StrategySelector {
    config: ScrollConfig,
    stats: BTreeMap<ScrollStrategy, StrategyStats>,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl StrategySelector {
    /// Create a selector with no history
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            stats: BTreeMap::new(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Learned stats for a strategy, if it has been tried
    pub fn stats(&self, strategy: ScrollStrategy) -> Option<&StrategyStats> {
        self.stats.get(&strategy)
    }

    /// Current score of a strategy
    pub fn score(&self, strategy: ScrollStrategy) -> f64 {
        self.stats
            .get(&strategy)
            .map(|s| s.score(self.config.prior_score))
            .unwrap_or(self.config.prior_score)
    }

    /// Strategies best-first; ties keep declaration order
    pub fn ranked(&self) -> Vec<ScrollStrategy> {
        let mut order = ScrollStrategy::ALL.to_vec();
        order.sort_by(|a, b| self.score(*b).total_cmp(&self.score(*a)));
        order
    }

    /// Record a strategy that moved the view
    pub fn record_success(&mut self, strategy: ScrollStrategy, duration: Duration, content_yield: f64) {
        let (smoothing, prior) = (self.config.smoothing, self.config.prior_score);
        self.stats
            .entry(strategy)
            .or_default()
            .record_success(duration, content_yield, smoothing, prior);
    }

    /// Record a strategy that errored or did not move the view
    pub fn record_failure(&mut self, strategy: ScrollStrategy) {
        let prior = self.config.prior_score;
        self.stats.entry(strategy).or_default().record_failure(prior);
    }

    /// Try strategies best-first until one moves the view, then wait for
    /// new content to render
    ///
    /// Success means the interaction worked; falling short of
    /// `expected_content_increase` only logs a warning, since the host may
    /// simply have nothing more to show.
    #[instrument(skip(self, page, waiter))]
    pub async fn scroll_to_load_content<P: PageDriver>(
        &mut self,
        page: &P,
        waiter: &ConditionWaiter,
        request: &ScrollRequest,
    ) -> ScrollResult {
        let started = Instant::now();
        let content_selector = self.config.content_selector.clone();
        let selector = content_selector.as_str();
        let settle_timeout = self.config.settle_timeout();

        let content_before = page.count(selector).await.unwrap_or(0);
        let mut attempted = Vec::with_capacity(ScrollStrategy::ALL.len());
        let mut last_error = None;

        for strategy in self.ranked() {
            attempted.push(strategy);
            let attempt_started = Instant::now();

            let distance = match strategy.execute(page, request, selector).await {
                Ok(distance) if distance > 0.0 => distance,
                Ok(_) => {
                    debug!("Strategy {} did not move the view", strategy);
                    last_error = Some(format!("{strategy}: view did not move"));
                    self.record_failure(strategy);
                    continue;
                }
                Err(e) => {
                    debug!("Strategy {} failed: {}", strategy, e);
                    last_error = Some(format!("{strategy}: {e}"));
                    self.record_failure(strategy);
                    continue;
                }
            };

            let content_after = if request.expected_content_increase == 0 {
                page.count(selector).await.unwrap_or(content_before)
            } else {
                let settled = waiter
                    .wait_for_condition(
                        move || async move {
                            let now = page.count(selector).await.unwrap_or(0);
                            Ok((now > content_before).then_some(now))
                        },
                        "content_load",
                        Some(settle_timeout),
                        None,
                    )
                    .await;
                match settled.result {
                    Some(count) => count,
                    None => page.count(selector).await.unwrap_or(content_before),
                }
            };

            let content_delta = content_after as i64 - content_before as i64;
            self.record_success(
                strategy,
                attempt_started.elapsed(),
                content_delta.max(0) as f64,
            );

            if content_delta < request.expected_content_increase as i64 {
                warn!(
                    "Strategy {} scrolled {:.0}px but content grew by {} (expected {})",
                    strategy, distance, content_delta, request.expected_content_increase
                );
            } else {
                info!(
                    "Strategy {} scrolled {:.0}px, {} new items",
                    strategy, distance, content_delta
                );
            }

            return ScrollResult {
                success: true,
                strategy: Some(strategy),
                attempted,
                duration: started.elapsed(),
                content_before,
                content_after,
                content_delta,
                distance_scrolled: distance,
                error: None,
            };
        }

        warn!("All scroll strategies failed: {:?}", last_error);
        ScrollResult {
            success: false,
            strategy: attempted.last().copied(),
            attempted,
            duration: started.elapsed(),
            content_before,
            content_after: content_before,
            content_delta: 0,
            distance_scrolled: 0.0,
            error: last_error,
        }
    }

    /// Stats for every strategy, best first
    pub fn get_performance_report(&self) -> ScrollReport {
        ScrollReport {
            strategies: self
                .ranked()
                .into_iter()
                .map(|strategy| StrategyReport {
                    strategy,
                    score: self.score(strategy),
                    stats: self.stats.get(&strategy).cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Forget all learned stats
    pub fn reset_stats(&mut self) {
        self.stats.clear();
    }
}
