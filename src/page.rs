use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

use crate::errors::PilotError;
use crate::types::WaitUntil;

/// Budget for the degraded load-event wait after a network-idle timeout
const IDLE_FALLBACK_BUDGET: Duration = Duration::from_secs(10);

/// Interval for readyState polling
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Navigate the page and wait for the requested condition within
/// `timeout_ms`.
///
/// A network-idle wait that times out degrades to a bounded load-event wait
/// instead of failing the navigation: pages with background polling never go
/// idle, and by that point the document is usually usable. The degradation is
/// a heuristic, not a guaranteed-correct wait.
pub async fn goto(
    page: &Page,
    url: &str,
    wait_until: WaitUntil,
    timeout_ms: u64,
) -> Result<(), PilotError> {
    let parsed = url::Url::parse(url).map_err(|e| PilotError::Navigation {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let budget = Duration::from_millis(timeout_ms);
    let started = Instant::now();

    match timeout(budget, page.goto(parsed.as_str())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            return Err(PilotError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(PilotError::Timeout {
                operation: format!("navigation to {}", url),
                timeout_ms,
            });
        }
    }

    let remaining = budget.saturating_sub(started.elapsed());
    match wait_until {
        // goto resolves once the frame has navigated and the DOM is being
        // parsed; nothing further to wait for.
        WaitUntil::DomContentLoaded => Ok(()),
        WaitUntil::Load => {
            if wait_ready_state(page, remaining).await {
                Ok(())
            } else {
                Err(PilotError::Timeout {
                    operation: format!("load of {}", url),
                    timeout_ms,
                })
            }
        }
        WaitUntil::NetworkIdle => {
            match timeout(remaining, page.wait_for_navigation()).await {
                Ok(Ok(_)) => {}
                _ => {
                    warn!(
                        "Network never went idle for {}, falling back to load state",
                        url
                    );
                    // The page may simply poll in the background; settle for
                    // the load event and carry on either way.
                    let _ = wait_ready_state(page, IDLE_FALLBACK_BUDGET).await;
                }
            }
            Ok(())
        }
    }
}

/// Poll `document.readyState` until it reports complete or the budget runs
/// out
async fn wait_ready_state(page: &Page, budget: Duration) -> bool {
    let deadline = Instant::now() + budget;
    loop {
        let state: Option<String> = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value().ok());
        if state.as_deref() == Some("complete") {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Text content of elements matching `selector`. With `all` false only the
/// first match is returned.
pub async fn extract_text(page: &Page, selector: &str, all: bool) -> Result<Vec<String>> {
    let elements = page
        .find_elements(selector)
        .await
        .with_context(|| format!("No elements found matching selector: {}", selector))?;

    if elements.is_empty() {
        anyhow::bail!("No elements found matching selector: {}", selector);
    }

    let mut texts = Vec::new();
    for element in &elements {
        if let Ok(Some(text)) = element.inner_text().await {
            let text = text.trim().to_string();
            if !text.is_empty() {
                texts.push(text);
            }
        }
        if !all && !texts.is_empty() {
            break;
        }
    }

    debug!(
        "Extracted {} text node(s) for selector '{}'",
        texts.len(),
        selector
    );
    Ok(texts)
}

/// Evaluate a JavaScript expression and return its JSON value
pub async fn evaluate(page: &Page, expression: &str) -> Result<serde_json::Value> {
    let value = page
        .evaluate(expression)
        .await
        .context("JavaScript evaluation failed")?
        .into_value()
        .unwrap_or(serde_json::Value::Null);
    Ok(value)
}

/// Capture a PNG screenshot to `path`
pub async fn screenshot(page: &Page, path: &str, full_page: bool) -> Result<usize> {
    let bytes = page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(full_page)
                .build(),
        )
        .await
        .context("Screenshot capture failed")?;

    let size = bytes.len();
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path))?;
    debug!("Wrote {} byte screenshot to {}", size, path);
    Ok(size)
}

/// URL of the page's current document, if it can be read
pub async fn current_url(page: &Page) -> Option<String> {
    page.url().await.ok().flatten()
}
