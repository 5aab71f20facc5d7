//! Page-level waits built on [`ConditionWaiter::wait_for_condition`]
//!
//! DOM query failures inside these predicates are treated as "not yet": a
//! node that is mid-render or briefly detached should not end the wait.

use super::waiter::{ConditionWaiter, TimeoutResult};
use crate::browser::PageDriver;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const QUIESCENCE_JS: &str = r#"
    (() => {
        const entries = performance.getEntriesByType('resource');
        const lastEnd = entries.reduce((max, e) => Math.max(max, e.responseEnd || 0), 0);
        return {
            ready: document.readyState === 'complete',
            idleMs: performance.now() - lastEnd
        };
    })()
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuiescenceProbe {
    ready: bool,
    idle_ms: f64,
}

impl ConditionWaiter {
    /// Wait until `selector` matches at least one element
    #[instrument(skip(self, page))]
    pub async fn wait_for_element<P: PageDriver>(
        &self,
        page: &P,
        selector: &str,
        timeout: Option<Duration>,
    ) -> TimeoutResult<P::Element> {
        let operation = format!("element:{selector}");
        self.wait_for_condition(
            move || async move { Ok(page.query(selector).await.ok().flatten()) },
            &operation,
            timeout,
            None,
        )
        .await
    }

    /// Wait until the download button exists, is enabled, and no loading
    /// indicator is present anywhere on the page
    #[instrument(skip(self, page))]
    pub async fn wait_for_download_ready<P: PageDriver>(
        &self,
        page: &P,
        button_selector: &str,
        timeout: Option<Duration>,
    ) -> TimeoutResult<P::Element> {
        let loading = &self.config().loading_selectors;
        self.wait_for_condition(
            move || async move {
                let Some(button) = page.query(button_selector).await.ok().flatten() else {
                    return Ok(None);
                };
                if page.is_disabled(&button).await.unwrap_or(true) {
                    return Ok(None);
                }
                for selector in loading {
                    if page.count(selector).await.unwrap_or(0) > 0 {
                        return Ok(None);
                    }
                }
                Ok(Some(button))
            },
            "download_ready",
            timeout,
            None,
        )
        .await
    }

    /// Wait until enough of `selectors` yield non-empty text
    ///
    /// The payload is the populated fraction at the moment the threshold was
    /// met. An empty selector set is trivially populated.
    #[instrument(skip(self, page, selectors))]
    pub async fn wait_for_metadata_population<P: PageDriver>(
        &self,
        page: &P,
        selectors: &[String],
        timeout: Option<Duration>,
    ) -> TimeoutResult<f64> {
        let required = self.config().metadata_population_ratio;
        self.wait_for_condition(
            move || async move {
                if selectors.is_empty() {
                    return Ok(Some(1.0));
                }
                let mut filled = 0usize;
                for selector in selectors {
                    let Some(element) = page.query(selector).await.ok().flatten() else {
                        continue;
                    };
                    let text = page.inner_text(&element).await.unwrap_or_default();
                    if !text.trim().is_empty() {
                        filled += 1;
                    }
                }
                let ratio = filled as f64 / selectors.len() as f64;
                Ok((ratio >= required).then_some(ratio))
            },
            "metadata_population",
            timeout,
            None,
        )
        .await
    }

    /// Wait until the document is complete and no resource has finished
    /// loading for `idle`
    ///
    /// If the page cannot answer the probe at all, the page's native
    /// network-idle wait is used instead.
    #[instrument(skip(self, page))]
    pub async fn wait_for_network_quiescence<P: PageDriver>(
        &self,
        page: &P,
        idle: Duration,
        timeout: Option<Duration>,
    ) -> TimeoutResult<()> {
        let idle_ms = idle.as_secs_f64() * 1000.0;
        let probed = self
            .wait_for_condition(
                move || async move {
                    let value = page.evaluate(QUIESCENCE_JS).await?;
                    let probe: QuiescenceProbe = serde_json::from_value(value)?;
                    Ok((probe.ready && probe.idle_ms >= idle_ms).then_some(()))
                },
                "network_quiescence",
                timeout,
                None,
            )
            .await;

        if probed.error.is_none() {
            return probed;
        }

        debug!(
            "Quiescence probe unavailable ({:?}), falling back to native idle wait",
            probed.error
        );
        let budget = probed.timeout_used;
        self.wait_for_condition(
            move || async move {
                let idle_reached = page.wait_for_network_idle(idle, budget).await?;
                Ok(idle_reached.then_some(()))
            },
            "network_idle_native",
            Some(budget),
            None,
        )
        .await
    }
}
