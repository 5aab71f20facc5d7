//! The page seam
//!
//! Every DOM query, read and interaction the engine performs goes through
//! [`PageDriver`]. The required methods map one-to-one onto what a CDP page
//! can do; geometry and scrolling helpers are provided on top of script
//! evaluation so a scripted page can override them directly.

use crate::error::{Error, PageError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Document-relative element geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge, including horizontal scroll
    pub x: f64,
    /// Top edge, including vertical scroll
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

const IS_VISIBLE_FN: &str = r#"
    function() {
        const style = window.getComputedStyle(this);
        if (style.display === 'none' || style.visibility === 'hidden') return false;
        const rect = this.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    }
"#;

const IS_DISABLED_FN: &str = r#"
    function() {
        return !!(this.disabled
            || this.getAttribute('aria-disabled') === 'true'
            || this.classList.contains('disabled'));
    }
"#;

const BOUNDING_BOX_FN: &str = r#"
    function() {
        const rect = this.getBoundingClientRect();
        return {
            x: rect.left + window.scrollX,
            y: rect.top + window.scrollY,
            width: rect.width,
            height: rect.height
        };
    }
"#;

const SCROLL_OFFSET_JS: &str = "window.scrollY";

const DOCUMENT_HEIGHT_JS: &str =
    "Math.max(document.body.scrollHeight, document.documentElement.scrollHeight)";

/// A handle onto one live page
///
/// Elements are opaque handles that stay valid until the host page detaches
/// them; any call on a detached element returns an error rather than
/// panicking.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Element handle type
    type Element: Clone + Send + Sync;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Visible text of an element
    async fn inner_text(&self, element: &Self::Element) -> Result<String>;

    /// Attribute value, `None` when absent
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Click the element
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Move the pointer over the element
    async fn hover(&self, element: &Self::Element) -> Result<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    /// Give the element keyboard focus
    async fn focus(&self, element: &Self::Element) -> Result<()>;

    /// Evaluate an expression against the page
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Call a function declaration with `this` bound to the element
    async fn call_on(&self, element: &Self::Element, function: &str) -> Result<Value>;

    /// Coarse native wait for `idle` without network activity
    ///
    /// Returns `false` if `timeout` elapsed first.
    async fn wait_for_network_idle(&self, idle: Duration, timeout: Duration) -> Result<bool>;

    /// First element matching `selector`
    async fn query(&self, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.query_all(selector).await?.len())
    }

    /// Whether the element is rendered with a non-empty box
    async fn is_visible(&self, element: &Self::Element) -> Result<bool> {
        let value = self.call_on(element, IS_VISIBLE_FN).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Whether the element is disabled
    async fn is_disabled(&self, element: &Self::Element) -> Result<bool> {
        let value = self.call_on(element, IS_DISABLED_FN).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Document-relative geometry, `None` when the element has no layout
    async fn bounding_box(&self, element: &Self::Element) -> Result<Option<BoundingBox>> {
        let value = self.call_on(element, BOUNDING_BOX_FN).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(serde_json::from_value(value).ok())
    }

    /// Current vertical scroll of the window
    async fn scroll_offset(&self) -> Result<f64> {
        let value = self.evaluate(SCROLL_OFFSET_JS).await?;
        value
            .as_f64()
            .ok_or_else(|| Error::script("window.scrollY was not a number"))
    }

    /// Full scrollable height of the document
    async fn document_height(&self) -> Result<f64> {
        let value = self.evaluate(DOCUMENT_HEIGHT_JS).await?;
        value
            .as_f64()
            .ok_or_else(|| Error::script("document height was not a number"))
    }

    /// Jump the window to `y`, returning the offset actually reached
    async fn scroll_window_to(&self, y: f64) -> Result<f64> {
        let script = format!("(() => {{ window.scrollTo(0, {y}); return window.scrollY; }})()");
        let value = self.evaluate(&script).await?;
        value
            .as_f64()
            .ok_or_else(|| Error::script("window.scrollTo did not report an offset"))
    }

    /// Advance a scroll container by `delta`, returning the distance moved
    ///
    /// With no selector the nearest scrollable ancestor of the first
    /// `fallback_content` match is used.
    async fn scroll_container_by(
        &self,
        container: Option<&str>,
        fallback_content: &str,
        delta: f64,
    ) -> Result<f64> {
        let script = format!(
            r#"
            (() => {{
                const explicit = {container};
                let el = explicit ? document.querySelector(explicit) : null;
                if (!el) {{
                    let node = document.querySelector({content});
                    while (node && node !== document.body) {{
                        const style = window.getComputedStyle(node);
                        if (/(auto|scroll)/.test(style.overflowY) && node.scrollHeight > node.clientHeight) {{
                            el = node;
                            break;
                        }}
                        node = node.parentElement;
                    }}
                }}
                if (!el) return null;
                const before = el.scrollTop;
                el.scrollTop = before + {delta};
                return el.scrollTop - before;
            }})()
            "#,
            container = serde_json::to_string(&container)?,
            content = serde_json::to_string(fallback_content)?,
        );
        let value = self.evaluate(&script).await?;
        if value.is_null() {
            return Err(PageError::NoScrollContainer.into());
        }
        value
            .as_f64()
            .ok_or_else(|| Error::script("container scroll did not report a distance"))
    }
}
