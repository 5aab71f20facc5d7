//! Field lookup by visible label
//!
//! Some hosts render a value next to a fixed label ("Creation Time") instead
//! of inline. The value is whatever follows the label: its next sibling in
//! the DOM, or the rest of the label's parent.

use crate::browser::PageDriver;
use tracing::debug;

/// Finds values that follow a landmark label inside an item
#[derive(Debug, Clone, Copy, Default)]
pub struct LandmarkLocator;

impl LandmarkLocator {
    /// Create a locator
    pub fn new() -> Self {
        Self
    }

    /// Value following `landmark` inside `item`
    ///
    /// Uses the item's DOM first and falls back to its rendered text when the
    /// page cannot evaluate scripts on the element.
    pub async fn value_for<P: PageDriver>(
        &self,
        page: &P,
        item: &P::Element,
        landmark: &str,
    ) -> Option<String> {
        match self.value_from_dom(page, item, landmark).await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => debug!("Landmark script failed, falling back to text: {}", e),
        }

        let text = page.inner_text(item).await.ok()?;
        value_after_label(&text, landmark)
    }

    async fn value_from_dom<P: PageDriver>(
        &self,
        page: &P,
        item: &P::Element,
        landmark: &str,
    ) -> crate::Result<Option<String>> {
        let function = format!(
            r#"
            function() {{
                const label = {label};
                const nodes = Array.from(this.querySelectorAll('*'));
                const text = (n) => (n.textContent || '').trim();
                const hit = nodes.find((n) => n.children.length === 0 && text(n) === label)
                    || nodes.find((n) => text(n) === label);
                if (!hit) return null;
                const sibling = hit.nextElementSibling;
                if (sibling && text(sibling)) return text(sibling);
                const parent = hit.parentElement;
                if (!parent) return null;
                const rest = text(parent).replace(label, '').trim();
                return rest || null;
            }}
            "#,
            label = serde_json::to_string(landmark)?,
        );
        let value = page.call_on(item, &function).await?;
        Ok(value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }
}

/// Value after `label` in rendered text
///
/// Either the remainder of the line that starts with the label, or the next
/// non-empty line when the label stands alone.
pub fn value_after_label(text: &str, label: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    while let Some(line) = lines.next() {
        let Some(rest) = line.strip_prefix(label) else {
            continue;
        };
        let rest = rest.trim_start_matches(':').trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        return lines.find(|l| !l.is_empty()).map(str::to_string);
    }
    None
}
