//! Session-stable item identifiers
//!
//! An item is identified by where it sits vertically (bucketed) and by its
//! class attribute. That is stable for one continuously-rendered list; if the
//! host re-sorts or recycles nodes into the same slot, two different items
//! can share a fingerprint.

use crate::browser::PageDriver;
use crate::config::NavigationConfig;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque identifier of one harvestable item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-computed identifier
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    /// Fingerprint of a position bucket and class string
    pub fn from_parts(position_bucket: i64, class_attr: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        position_bucket.hash(&mut hasher);
        class_attr.hash(&mut hasher);
        Self(format!("{:016x}", hasher.finish()))
    }

    /// The identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bucket index of a document-relative vertical position
pub fn position_bucket(y: f64, bucket_px: f64) -> i64 {
    if bucket_px <= 0.0 {
        return y.floor() as i64;
    }
    (y / bucket_px).floor() as i64
}

/// Class attribute with state-only tokens removed, in original order
pub fn stable_classes(class_attr: &str, volatile: &[String]) -> String {
    class_attr
        .split_whitespace()
        .filter(|token| !volatile.iter().any(|v| v == token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fingerprint a rendered element; `None` when its geometry is unavailable
pub async fn fingerprint_element<P: PageDriver>(
    page: &P,
    element: &P::Element,
    config: &NavigationConfig,
) -> Option<Fingerprint> {
    let bbox = page.bounding_box(element).await.ok()??;
    let class_attr = page
        .attribute(element, &config.class_attribute)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    let classes = stable_classes(&class_attr, &config.volatile_classes);
    Some(Fingerprint::from_parts(
        position_bucket(bbox.y, config.position_bucket_px),
        &classes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_parts_same_fingerprint() {
        assert_eq!(
            Fingerprint::from_parts(12, "card grid-item"),
            Fingerprint::from_parts(12, "card grid-item")
        );
    }

    #[test]
    fn test_parts_distinguish() {
        let base = Fingerprint::from_parts(12, "card");
        assert_ne!(base, Fingerprint::from_parts(13, "card"));
        assert_ne!(base, Fingerprint::from_parts(12, "card wide"));
    }

    #[test]
    fn test_position_bucket() {
        assert_eq!(position_bucket(0.0, 50.0), 0);
        assert_eq!(position_bucket(49.9, 50.0), 0);
        assert_eq!(position_bucket(50.0, 50.0), 1);
        assert_eq!(position_bucket(1234.0, 50.0), 24);
        assert_eq!(position_bucket(-10.0, 50.0), -1);
    }

    #[test]
    fn test_stable_classes_drops_state_tokens() {
        let volatile = vec!["active".to_string(), "selected".to_string()];
        assert_eq!(stable_classes("card active  wide", &volatile), "card wide");
        assert_eq!(stable_classes("selected", &volatile), "");
    }

    #[test]
    fn test_fingerprint_serializes_as_string() {
        let fp = Fingerprint::new("abc123");
        assert_eq!(serde_json::to_string(&fp).unwrap(), "\"abc123\"");
        assert_eq!(fp.to_string(), "abc123");
    }
}
