//! CDP implementation of the page seam

use super::controller::PageHandle;
use super::driver::PageDriver;
use crate::error::{Error, PageError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::CallFunctionOnParams;
use chromiumoxide::element::Element;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
impl PageDriver for PageHandle {
    type Element = Arc<Element>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>> {
        let elements =
            self.page
                .find_elements(selector)
                .await
                .map_err(|e| PageError::QueryFailed {
                    selector: selector.to_string(),
                    message: e.to_string(),
                })?;
        Ok(elements.into_iter().map(Arc::new).collect())
    }

    async fn inner_text(&self, element: &Self::Element) -> Result<String> {
        let text = element
            .inner_text()
            .await
            .map_err(|e| PageError::Detached(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        element
            .attribute(name)
            .await
            .map_err(|e| PageError::Detached(e.to_string()).into())
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        element
            .click()
            .await
            .map_err(|e| PageError::InteractionFailed(format!("click: {e}")))?;
        Ok(())
    }

    async fn hover(&self, element: &Self::Element) -> Result<()> {
        element
            .hover()
            .await
            .map_err(|e| PageError::InteractionFailed(format!("hover: {e}")))?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()> {
        element
            .scroll_into_view()
            .await
            .map_err(|e| PageError::InteractionFailed(format!("scroll_into_view: {e}")))?;
        Ok(())
    }

    async fn focus(&self, element: &Self::Element) -> Result<()> {
        element
            .focus()
            .await
            .map_err(|e| PageError::InteractionFailed(format!("focus: {e}")))?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| Error::script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn call_on(&self, element: &Self::Element, function: &str) -> Result<Value> {
        let params = CallFunctionOnParams::builder()
            .object_id(element.remote_object_id.clone())
            .function_declaration(function)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(Error::script)?;

        let response = self
            .page
            .execute(params)
            .await
            .map_err(|e| PageError::Detached(e.to_string()))?;

        if let Some(details) = &response.result.exception_details {
            return Err(Error::script(details.text.clone()));
        }
        Ok(response.result.result.value.clone().unwrap_or(Value::Null))
    }

    async fn wait_for_network_idle(&self, idle: Duration, timeout: Duration) -> Result<bool> {
        let idle_ms = idle.as_millis();
        let timeout_ms = timeout.as_millis();
        let script = format!(
            r#"
            new Promise(resolve => {{
                const started = performance.now();
                let lastCount = performance.getEntriesByType('resource').length;
                let quietSince = performance.now();
                const check = () => {{
                    const count = performance.getEntriesByType('resource').length;
                    const now = performance.now();
                    if (count !== lastCount) {{
                        lastCount = count;
                        quietSince = now;
                    }}
                    if (now - quietSince >= {idle_ms}) {{
                        resolve(true);
                    }} else if (now - started >= {timeout_ms}) {{
                        resolve(false);
                    }} else {{
                        setTimeout(check, 50);
                    }}
                }};
                check();
            }})
            "#
        );

        match tokio::time::timeout(timeout + Duration::from_secs(1), self.evaluate(&script)).await {
            Ok(value) => Ok(value?.as_bool().unwrap_or(false)),
            Err(_) => Ok(false),
        }
    }
}
