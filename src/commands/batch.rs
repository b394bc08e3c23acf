use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::output::print_result;
use crate::page;
use crate::session::{AcquireOptions, SessionManager};
use crate::types::WaitUntil;

/// Process a file of URLs (one per line) through a bounded worker pool.
///
/// The concurrency limit is backpressure, not parallelism: one driver
/// multiplexes every page, and the pool just caps how many navigations are in
/// flight. Per-URL failures land in the result array instead of aborting the
/// run.
pub async fn handle_urls(
    manager: Arc<SessionManager>,
    session_id: &str,
    file: String,
    extract: Option<String>,
    concurrency: usize,
    acquire: AcquireOptions,
) -> Result<()> {
    let content =
        std::fs::read_to_string(&file).with_context(|| format!("File not found: {}", file))?;
    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if urls.is_empty() {
        anyhow::bail!("No URLs found in {}", file);
    }

    info!(
        "Processing {} URLs with concurrency {}",
        urls.len(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut workers = JoinSet::new();

    for (index, url) in urls.into_iter().enumerate() {
        let manager = manager.clone();
        let semaphore = semaphore.clone();
        let extract = extract.clone();
        let acquire = acquire.clone();
        let worker_id = format!("{}-batch-{}", session_id, index);

        workers.spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let result = process_url(&manager, &worker_id, &url, extract.as_deref(), &acquire).await;
            // Worker sessions are one-shot; leaving them registered would pin
            // one browser per URL for the rest of the process.
            manager.close(&worker_id).await;
            match result {
                Ok(value) => value,
                Err(e) => json!({ "url": url, "error": e.to_string() }),
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(value) => results.push(value),
            Err(e) => results.push(json!({ "error": format!("worker panicked: {}", e) })),
        }
    }

    print_result(&results, manager.settings().format);
    Ok(())
}

async fn process_url(
    manager: &SessionManager,
    worker_id: &str,
    url: &str,
    extract: Option<&str>,
    acquire: &AcquireOptions,
) -> Result<serde_json::Value> {
    let session = manager.acquire(worker_id, acquire).await?;
    page::goto(
        session.page(),
        url,
        WaitUntil::DomContentLoaded,
        manager.settings().timeout_ms,
    )
    .await?;

    if let Some(selector) = extract {
        let texts = page::extract_text(session.page(), selector, true).await?;
        Ok(json!({ "url": url, "extracted": texts }))
    } else {
        let title = page::evaluate(session.page(), "document.title").await?;
        Ok(json!({ "url": url, "title": title }))
    }
}
