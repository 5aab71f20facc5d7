//! Item navigation and duplicate suppression
//!
//! [`NavigationTracker`] keeps exactly one item active, moves forward through
//! the rendered list without revisiting anything, refuses to loop, and tells
//! the caller when extracted content repeats something already harvested.

pub mod fingerprint;
pub mod similarity;
pub mod tracker;

pub use fingerprint::{fingerprint_element, position_bucket, stable_classes, Fingerprint};
pub use similarity::positional_similarity;
pub use tracker::{
    DuplicateCheck, MetadataRecord, NavigationOutcome, NavigationStats, NavigationTracker,
};
