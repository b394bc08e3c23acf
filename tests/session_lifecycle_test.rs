//! Session lifecycle tests.
//!
//! Tests marked `#[ignore]` need a local Chrome/Chromium install; run them
//! with `cargo test -- --ignored` on a machine with a browser.

use std::sync::Arc;

use webpilot::{AcquireOptions, PortRegistry, SessionManager, SessionMode, Settings};

fn scratch_manager(dir: &tempfile::TempDir) -> Arc<SessionManager> {
    let registry = PortRegistry::at(dir.path().join("browser-port"));
    let settings = Settings {
        headless: true,
        ..Settings::default()
    };
    Arc::new(SessionManager::new(settings, registry))
}

fn fresh_opts() -> AcquireOptions {
    AcquireOptions {
        headless: Some(true),
        mode: Some(SessionMode::Fresh),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium install
async fn test_same_id_returns_identical_session() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    let first = manager.acquire("shared", &fresh_opts()).await.unwrap();
    let second = manager.acquire("shared", &fresh_opts()).await.unwrap();

    // Reference equality: the registry hands back the same instance, and the
    // second acquire performed no navigation
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.len(), 1);

    manager.close_all().await;
}

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium install
async fn test_distinct_ids_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    let first = manager.acquire("one", &fresh_opts()).await.unwrap();
    let second = manager.acquire("two", &fresh_opts()).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    // Closing one must not affect the other's liveness
    manager.close("one").await;
    let value = webpilot::page::evaluate(second.page(), "1 + 1")
        .await
        .unwrap();
    assert_eq!(value, serde_json::json!(2));

    manager.close_all().await;
}

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium install
async fn test_fresh_close_terminates_browser() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    let session = manager.acquire("ephemeral", &fresh_opts()).await.unwrap();
    let page = session.page().clone();
    webpilot::page::evaluate(&page, "1").await.unwrap();

    manager.close("ephemeral").await;

    // The underlying process is gone, so the page connection is dead
    assert!(webpilot::page::evaluate(&page, "1").await.is_err());
}

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium install
async fn test_persistent_close_leaves_browser_reachable() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    let opts = AcquireOptions {
        headless: Some(true),
        mode: Some(SessionMode::Persistent),
        ..Default::default()
    };
    let session = manager.acquire("shared", &opts).await.unwrap();
    let handle = session.process().expect("this invocation launched it");

    manager.close("shared").await;

    // Closing the session detached only; the process still answers
    assert!(PortRegistry::verify_live(handle.port));

    // Clean up the detached browser so the test leaves nothing behind
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(handle.pid as i32), Signal::SIGTERM);
    }
}

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium install
async fn test_concurrent_acquires_launch_one_browser() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.acquire("shared-id", &fresh_opts()).await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.acquire("shared-id", &fresh_opts()).await })
    };

    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.len(), 1);

    manager.close_all().await;
}

#[tokio::test]
async fn test_failed_acquire_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let manager = scratch_manager(&dir);

    // cdp mode with an endpoint nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);

    let opts = AcquireOptions {
        mode: Some(SessionMode::Cdp),
        cdp_endpoint: Some(format!("http://127.0.0.1:{}", dead_port)),
        ..Default::default()
    };

    let err = manager.acquire("poisoned", &opts).await.unwrap_err();
    assert!(matches!(err, webpilot::PilotError::AttachFailure { .. }));

    // The failure was not registered; the id is free to retry
    assert!(manager.get("poisoned").is_none());
    assert_eq!(manager.len(), 0);
}
