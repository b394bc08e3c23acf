use anyhow::Result;
use serde_json::json;

use crate::output::print_result;
use crate::page;
use crate::session::{AcquireOptions, SessionManager};
use crate::types::WaitUntil;

/// Extract text content from elements matching a selector
pub async fn handle_text(
    manager: &SessionManager,
    session_id: &str,
    selector: String,
    url: Option<String>,
    all: bool,
    acquire: AcquireOptions,
) -> Result<()> {
    let session = manager.acquire(session_id, &acquire).await?;
    if let Some(url) = url {
        page::goto(
            session.page(),
            &url,
            WaitUntil::DomContentLoaded,
            manager.settings().timeout_ms,
        )
        .await?;
    }

    let texts = page::extract_text(session.page(), &selector, all).await?;
    let result = json!({
        "selector": selector,
        "count": texts.len(),
        "text": if all {
            serde_json::Value::from(texts)
        } else {
            serde_json::Value::from(texts.into_iter().next().unwrap_or_default())
        },
    });
    print_result(&result, manager.settings().format);
    Ok(())
}
