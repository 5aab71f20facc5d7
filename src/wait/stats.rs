//! Per-operation timing profiles
//!
//! Each named wait operation keeps a bounded window of its recent successful
//! durations. Once enough samples exist the operation's budget is learned
//! from the window instead of using the configured default.

use crate::config::WaitConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Fixed-capacity ring buffer of durations
#[derive(Debug, Clone)]
pub struct SampleWindow {
    data: Vec<Duration>,
    capacity: usize,
    /// Position of next write (wraps around)
    write_pos: usize,
    /// Total samples received (may exceed capacity)
    total_samples: u64,
}

impl SampleWindow {
    /// Create an empty window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            write_pos: 0,
            total_samples: 0,
        }
    }

    /// Add a sample, evicting the oldest once full
    pub fn push(&mut self, value: Duration) {
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.write_pos] = value;
        }
        self.write_pos = (self.write_pos + 1) % self.capacity;
        self.total_samples += 1;
    }

    /// Samples currently held
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no samples are held
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Samples ever pushed
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Percentile over the held samples (`p` in 0.0..=1.0)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.data.is_empty() {
            return None;
        }
        let mut sorted = self.data.clone();
        sorted.sort();
        let idx = ((sorted.len() as f64 - 1.0) * p.clamp(0.0, 1.0)).round() as usize;
        sorted.get(idx).copied()
    }

    /// Arithmetic mean of the held samples
    pub fn mean(&self) -> Option<Duration> {
        if self.data.is_empty() {
            return None;
        }
        let total: Duration = self.data.iter().sum();
        Some(total / self.data.len() as u32)
    }
}

/// Learned timing profile of one wait operation
#[derive(Debug, Clone)]
pub struct OperationStats {
    window: SampleWindow,
    successes: u64,
    timeouts: u64,
    errors: u64,
    learned_timeout: Option<Duration>,
    last_updated: Option<DateTime<Utc>>,
}

impl OperationStats {
    /// Fresh profile sized by the config's sample window
    pub fn new(config: &WaitConfig) -> Self {
        Self {
            window: SampleWindow::new(config.sample_window),
            successes: 0,
            timeouts: 0,
            errors: 0,
            learned_timeout: None,
            last_updated: None,
        }
    }

    /// Record a successful wait and relearn the budget
    pub fn record_success(&mut self, duration: Duration, config: &WaitConfig) {
        self.window.push(duration);
        self.successes += 1;
        self.last_updated = Some(Utc::now());

        if self.window.len() >= config.min_samples {
            if let Some(p) = self.window.percentile(config.percentile) {
                let scaled = p.mul_f64(config.timeout_multiplier);
                self.learned_timeout =
                    Some(scaled.max(config.min_timeout()).min(config.max_timeout()));
            }
        }
    }

    /// Record a wait that ran out of budget
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
        self.last_updated = Some(Utc::now());
    }

    /// Record a wait whose predicate failed
    pub fn record_error(&mut self) {
        self.errors += 1;
        self.last_updated = Some(Utc::now());
    }

    /// Budget to use for the next call
    pub fn optimal_timeout(&self, config: &WaitConfig) -> Duration {
        self.learned_timeout
            .unwrap_or_else(|| config.default_timeout())
    }

    /// Learned budget, once enough samples exist
    pub fn learned_timeout(&self) -> Option<Duration> {
        self.learned_timeout
    }

    /// Successful waits
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Waits that timed out
    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    /// Waits whose predicate failed
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Successful durations currently in the window
    pub fn samples(&self) -> usize {
        self.window.len()
    }

    /// Snapshot for reporting
    pub fn report(&self, config: &WaitConfig) -> OperationReport {
        let calls = self.successes + self.timeouts + self.errors;
        OperationReport {
            calls,
            successes: self.successes,
            timeouts: self.timeouts,
            errors: self.errors,
            success_rate: if calls == 0 {
                0.0
            } else {
                self.successes as f64 / calls as f64
            },
            samples: self.window.len(),
            mean_ms: self.window.mean().map(|d| d.as_secs_f64() * 1000.0),
            p95_ms: self
                .window
                .percentile(0.95)
                .map(|d| d.as_secs_f64() * 1000.0),
            learned_timeout_ms: self.learned_timeout.map(|d| d.as_millis() as u64),
            current_timeout_ms: self.optimal_timeout(config).as_millis() as u64,
            last_updated: self.last_updated,
        }
    }
}

/// Serializable view of one operation's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    /// Total waits
    pub calls: u64,
    /// Successful waits
    pub successes: u64,
    /// Waits that timed out
    pub timeouts: u64,
    /// Waits whose predicate failed
    pub errors: u64,
    /// successes / calls
    pub success_rate: f64,
    /// Samples in the window
    pub samples: usize,
    /// Mean successful duration
    pub mean_ms: Option<f64>,
    /// 95th percentile successful duration
    pub p95_ms: Option<f64>,
    /// Learned budget, if any
    pub learned_timeout_ms: Option<u64>,
    /// Budget the next call will use
    pub current_timeout_ms: u64,
    /// Last time the profile changed
    pub last_updated: Option<DateTime<Utc>>,
}

/// Per-operation report returned by the waiter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Reports keyed by operation name
    pub operations: BTreeMap<String, OperationReport>,
}

impl PerformanceReport {
    /// Waits across all operations
    pub fn total_calls(&self) -> u64 {
        self.operations.values().map(|op| op.calls).sum()
    }
}
