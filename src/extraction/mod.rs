//! Metadata extraction
//!
//! Turns an item's rendered text into a creation timestamp and a descriptive
//! prompt. Regex extraction comes first; [`LandmarkLocator`] covers hosts
//! that put the timestamp beside a label instead of inline.

pub mod landmark;
pub mod metadata;
pub mod patterns;

pub use landmark::{value_after_label, LandmarkLocator};
pub use metadata::{parse_timestamp, ContentExtractor, ExtractedMetadata};
