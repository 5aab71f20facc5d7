//! Adaptive waiting
//!
//! [`ConditionWaiter`] polls an async predicate until it holds or a budget
//! runs out. Budgets are learned per named operation from recent successful
//! durations, so waits that usually finish in 300ms stop reserving the full
//! default timeout.

pub mod conditions;
pub mod stats;
pub mod waiter;

pub use stats::{OperationReport, OperationStats, PerformanceReport, SampleWindow};
pub use waiter::{ConditionWaiter, TimeoutResult, EARLY_COMPLETION_MARGIN};
