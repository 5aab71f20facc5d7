//! The three ways of getting the host page to render more items

use crate::browser::PageDriver;
use crate::error::{PageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A content-loading technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStrategy {
    /// Advance the scroll offset of the list's container
    ContainerOffset,
    /// Scroll a target element (default: last loaded item) into view
    ElementIntoView,
    /// Jump the whole document, bounded by its height
    DocumentJump,
}

impl ScrollStrategy {
    /// Every strategy, in declaration order
    pub const ALL: [ScrollStrategy; 3] = [
        ScrollStrategy::ContainerOffset,
        ScrollStrategy::ElementIntoView,
        ScrollStrategy::DocumentJump,
    ];

    /// Stable name used in logs and reports
    pub fn name(self) -> &'static str {
        match self {
            ScrollStrategy::ContainerOffset => "container_offset",
            ScrollStrategy::ElementIntoView => "element_into_view",
            ScrollStrategy::DocumentJump => "document_jump",
        }
    }

    /// Run the strategy once, returning how far the view moved in pixels
    pub(crate) async fn execute<P: PageDriver>(
        self,
        page: &P,
        request: &ScrollRequest,
        content_selector: &str,
    ) -> Result<f64> {
        match self {
            ScrollStrategy::ContainerOffset => {
                let moved = page
                    .scroll_container_by(
                        request.container_selector.as_deref(),
                        content_selector,
                        request.max_distance,
                    )
                    .await?;
                Ok(moved.abs())
            }
            ScrollStrategy::ElementIntoView => {
                let selector = request
                    .target_selector
                    .as_deref()
                    .unwrap_or(content_selector);
                let target =
                    page.query_all(selector)
                        .await?
                        .pop()
                        .ok_or_else(|| PageError::QueryFailed {
                            selector: selector.to_string(),
                            message: "no scroll target rendered".to_string(),
                        })?;

                let before = viewport_top(page, &target).await?;
                page.scroll_into_view(&target).await?;
                let after = viewport_top(page, &target).await?;
                Ok((before - after).abs())
            }
            ScrollStrategy::DocumentJump => {
                let before = page.scroll_offset().await?;
                let height = page.document_height().await?;
                let target = (before + request.max_distance).min(height);
                let reached = page.scroll_window_to(target).await?;
                Ok((reached - before).abs())
            }
        }
    }
}

impl fmt::Display for ScrollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top of an element relative to the viewport
async fn viewport_top<P: PageDriver>(page: &P, element: &P::Element) -> Result<f64> {
    let bbox = page.bounding_box(element).await?.unwrap_or_default();
    let offset = page.scroll_offset().await?;
    Ok(bbox.y - offset)
}

/// Parameters of one load-more request
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRequest {
    /// Scroll container; auto-detected from the content when absent
    pub container_selector: Option<String>,
    /// Element to bring into view; last content element when absent
    pub target_selector: Option<String>,
    /// Largest distance a single offset or jump may cover
    pub max_distance: f64,
    /// New elements the caller hopes for; only checked for logging
    pub expected_content_increase: usize,
}

impl Default for ScrollRequest {
    fn default() -> Self {
        Self {
            container_selector: None,
            target_selector: None,
            max_distance: 800.0,
            expected_content_increase: 1,
        }
    }
}

impl ScrollRequest {
    /// Request with the given maximum distance
    pub fn new(max_distance: f64) -> Self {
        Self {
            max_distance,
            ..Self::default()
        }
    }

    /// Set the scroll container
    pub fn container<S: Into<String>>(mut self, selector: S) -> Self {
        self.container_selector = Some(selector.into());
        self
    }

    /// Set the element to bring into view
    pub fn target<S: Into<String>>(mut self, selector: S) -> Self {
        self.target_selector = Some(selector.into());
        self
    }

    /// Set the expected number of new elements
    pub fn expect(mut self, increase: usize) -> Self {
        self.expected_content_increase = increase;
        self
    }
}
