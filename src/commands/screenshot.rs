use anyhow::Result;
use serde_json::json;

use crate::output::print_result;
use crate::page;
use crate::session::{AcquireOptions, SessionManager};
use crate::types::WaitUntil;

/// Capture the session's current page as a PNG file
pub async fn handle_screenshot(
    manager: &SessionManager,
    session_id: &str,
    url: Option<String>,
    output: String,
    full_page: bool,
    acquire: AcquireOptions,
) -> Result<()> {
    let session = manager.acquire(session_id, &acquire).await?;
    if let Some(url) = url {
        page::goto(
            session.page(),
            &url,
            WaitUntil::Load,
            manager.settings().timeout_ms,
        )
        .await?;
    }

    let bytes = page::screenshot(session.page(), &output, full_page).await?;
    let result = json!({
        "file": output,
        "bytes": bytes,
        "full_page": full_page,
    });
    print_result(&result, manager.settings().format);
    Ok(())
}
