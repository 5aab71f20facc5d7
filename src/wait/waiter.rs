//! Self-tuning condition poller

use super::stats::{OperationStats, PerformanceReport};
use crate::config::WaitConfig;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Slack below the budget that still counts as finishing early
pub const EARLY_COMPLETION_MARGIN: Duration = Duration::from_millis(100);

/// Outcome of one wait
#[derive(Debug, Clone)]
pub struct TimeoutResult<T> {
    /// Operation the wait was recorded under
    pub operation: String,
    /// Whether the predicate became truthy within budget
    pub success: bool,
    /// Value produced by the predicate on success
    pub result: Option<T>,
    /// Wall-clock time spent
    pub duration: Duration,
    /// Budget the wait ran under
    pub timeout_used: Duration,
    /// Finished comfortably inside the budget
    pub early_completion: bool,
    /// Predicate failure, if any
    pub error: Option<String>,
}

impl<T> TimeoutResult<T> {
    /// Whether the wait ran out of budget without a predicate failure
    pub fn timed_out(&self) -> bool {
        !self.success && self.error.is_none()
    }

    /// Take the payload, discarding timing
    pub fn into_result(self) -> Option<T> {
        self.result
    }
}

/// Polls conditions with per-operation learned budgets
///
/// One waiter belongs to one harvesting session. Its stats map sits behind a
/// mutex that is never held across an await, so the waiter can be lent by
/// shared reference to every component that waits.
#[derive(Debug)]
pub struct ConditionWaiter {
    config: WaitConfig,
    stats: Mutex<HashMap<String, OperationStats>>,
}

impl Default for ConditionWaiter {
    fn default() -> Self {
        Self::new(WaitConfig::default())
    }
}

impl ConditionWaiter {
    /// Create a waiter with no learned history
    pub fn new(config: WaitConfig) -> Self {
        Self {
            config,
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Budget the next wait for `operation` would use
    pub fn optimal_timeout(&self, operation: &str) -> Duration {
        self.stats
            .lock()
            .get(operation)
            .map(|stats| stats.optimal_timeout(&self.config))
            .unwrap_or_else(|| self.config.default_timeout())
    }

    /// Poll `predicate` until it yields a value or the budget runs out
    ///
    /// `Ok(Some(v))` ends the wait successfully with `v`, `Ok(None)` keeps
    /// polling, and `Err` ends it unsuccessfully with the error recorded.
    /// Without `max_timeout` the learned budget for `operation` applies.
    /// Each predicate call is itself bounded by the remaining budget.
    pub async fn wait_for_condition<T, F, Fut>(
        &self,
        mut predicate: F,
        operation: &str,
        max_timeout: Option<Duration>,
        poll_interval: Option<Duration>,
    ) -> TimeoutResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let budget = max_timeout.unwrap_or_else(|| self.optimal_timeout(operation));
        let poll = poll_interval.unwrap_or_else(|| self.config.poll_interval());
        let start = Instant::now();
        let deadline = start + budget;

        let outcome = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, predicate()).await {
                Ok(Ok(Some(value))) => break Ok(Some(value)),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => break Err(e),
                Err(_) => break Ok(None),
            }

            let now = Instant::now();
            if now >= deadline {
                break Ok(None);
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        };

        let duration = start.elapsed();

        match outcome {
            Ok(Some(value)) => {
                self.with_stats(operation, |stats, config| {
                    stats.record_success(duration, config)
                });
                debug!(
                    "Wait '{}' satisfied after {:?} (budget {:?})",
                    operation, duration, budget
                );
                TimeoutResult {
                    operation: operation.to_string(),
                    success: true,
                    result: Some(value),
                    duration,
                    timeout_used: budget,
                    early_completion: duration + EARLY_COMPLETION_MARGIN < budget,
                    error: None,
                }
            }
            Ok(None) => {
                self.with_stats(operation, |stats, _| stats.record_timeout());
                debug!("Wait '{}' timed out after {:?}", operation, duration);
                TimeoutResult {
                    operation: operation.to_string(),
                    success: false,
                    result: None,
                    duration,
                    timeout_used: budget,
                    early_completion: false,
                    error: None,
                }
            }
            Err(e) => {
                self.with_stats(operation, |stats, _| stats.record_error());
                warn!("Wait '{}' predicate failed: {}", operation, e);
                TimeoutResult {
                    operation: operation.to_string(),
                    success: false,
                    result: None,
                    duration,
                    timeout_used: budget,
                    early_completion: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// [`Self::wait_for_condition`] for predicates that only answer yes/no
    pub async fn wait_until<F, Fut>(
        &self,
        mut predicate: F,
        operation: &str,
        max_timeout: Option<Duration>,
    ) -> TimeoutResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.wait_for_condition(
            move || {
                let check = predicate();
                async move { check.await.map(|ok| ok.then_some(())) }
            },
            operation,
            max_timeout,
            None,
        )
        .await
    }

    /// Snapshot of every operation's profile
    pub fn get_performance_report(&self) -> PerformanceReport {
        let stats = self.stats.lock();
        PerformanceReport {
            operations: stats
                .iter()
                .map(|(name, s)| (name.clone(), s.report(&self.config)))
                .collect(),
        }
    }

    /// Forget everything learned about one operation
    pub fn reset_operation(&self, operation: &str) {
        self.stats.lock().remove(operation);
    }

    /// Forget everything learned
    pub fn reset(&self) {
        self.stats.lock().clear();
    }

    fn with_stats<F>(&self, operation: &str, update: F)
    where
        F: FnOnce(&mut OperationStats, &WaitConfig),
    {
        let mut stats = self.stats.lock();
        let entry = stats
            .entry(operation.to_string())
            .or_insert_with(|| OperationStats::new(&self.config));
        update(entry, &self.config);
    }
}
