//! Loading more content
//!
//! A virtualized list only renders more items once the view moves. Which kind
//! of movement the host reacts to varies, so [`StrategySelector`] keeps score
//! of three techniques and tries the best one first.

pub mod selector;
pub mod strategy;

pub use selector::{ScrollReport, ScrollResult, StrategyReport, StrategySelector, StrategyStats};
pub use strategy::{ScrollRequest, ScrollStrategy};
