use anyhow::Result;
use serde_json::json;

use crate::output::print_result;
use crate::page;
use crate::session::{AcquireOptions, SessionManager};
use crate::types::WaitUntil;

/// Navigate the session's current page to a URL
pub async fn handle_goto(
    manager: &SessionManager,
    session_id: &str,
    url: String,
    wait_until: WaitUntil,
    acquire: AcquireOptions,
) -> Result<()> {
    let session = manager.acquire(session_id, &acquire).await?;
    page::goto(
        session.page(),
        &url,
        wait_until,
        manager.settings().timeout_ms,
    )
    .await?;

    let result = json!({
        "session": session.id(),
        "mode": session.mode(),
        "url": page::current_url(session.page()).await,
    });
    print_result(&result, manager.settings().format);
    Ok(())
}
