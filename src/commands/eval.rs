use anyhow::Result;

use crate::output::print_result;
use crate::page;
use crate::session::{AcquireOptions, SessionManager};
use crate::types::WaitUntil;

/// Evaluate a JavaScript expression in the session's current page
pub async fn handle_eval(
    manager: &SessionManager,
    session_id: &str,
    expression: String,
    url: Option<String>,
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

    let value = page::evaluate(session.page(), &expression).await?;
    print_result(&value, manager.settings().format);
    Ok(())
}
