//! Browser automation module
//!
//! Browser lifecycle through ChromiumOxide plus the [`PageDriver`] seam the
//! engine drives pages through.

pub mod cdp;
pub mod controller;
pub mod driver;

pub use controller::{validate_target, BrowserConfig, BrowserController, PageHandle};
pub use driver::{BoundingBox, PageDriver};
