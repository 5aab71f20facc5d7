//! scroll-harvest - adaptive harvesting of infinitely-scrolling web lists
//!
//! Harvests timestamped items from a virtualized list in a live browser page
//! while the list keeps loading more content as it scrolls.
//!
//! # Components
//!
//! - **Adaptive waits** ([`wait`]): poll a condition with per-operation
//!   timeouts learned from recent successes
//! - **Scroll strategies** ([`scroll`]): rank three ways of loading more content
//!   and fall through them in score order
//! - **Navigation** ([`navigation`]): keep one item active, move forward without
//!   revisiting, refuse cycles, flag duplicate content
//! - **Extraction** ([`extraction`]): regex-based timestamp and prompt
//!   extraction from item text
//!
//! # Architecture
//!
//! ```text
//!                 HarvestSession
//!        ┌──────────────┼───────────────┐
//!        ▼              ▼               ▼
//!  NavigationTracker  StrategySelector  ContentExtractor
//!        │              │
//!        └──────┬───────┘
//!               ▼
//!        ConditionWaiter ──▶ PageDriver (CDP)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scroll_harvest::browser::{BrowserConfig, BrowserController};
//! use scroll_harvest::harvest::HarvestSession;
//! use scroll_harvest::HarvestConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = BrowserController::launch(&BrowserConfig::default()).await?;
//!     let page = controller.open("https://example.com/gallery").await?;
//!
//!     let config = HarvestConfig::builder().max_items(20).build();
//!     let mut session = HarvestSession::new(&page, config)?;
//!     let report = session.run().await;
//!
//!     println!("Harvested {} items", report.items.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod config;
pub mod error;
pub mod extraction;
pub mod harvest;
pub mod navigation;
pub mod scroll;
pub mod wait;

// Re-exports for convenience
pub use browser::{BrowserController, PageDriver};
pub use config::HarvestConfig;
pub use error::{Error, Result};
pub use extraction::ContentExtractor;
pub use harvest::HarvestSession;
pub use navigation::NavigationTracker;
pub use scroll::StrategySelector;
pub use wait::ConditionWaiter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
