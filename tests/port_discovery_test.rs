//! Cross-process discovery round-trip: the port file is a cache whose
//! contents are only trusted after a live probe.

use std::net::TcpListener;
use std::time::Duration;

use webpilot::PortRegistry;
use webpilot::launcher::ProcessLauncher;

#[test]
fn test_dead_record_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PortRegistry::at(dir.path().join("browser-port"));

    // A previous invocation recorded a browser that has since died
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);
    registry.save(dead_port, 9999).unwrap();

    // Load finds the record, the probe rejects it, and the registry is
    // treated as empty afterwards
    assert_eq!(registry.load(), Some(dead_port));
    assert!(!PortRegistry::verify_live(dead_port));
    assert_eq!(registry.load_verified(), None);
    assert_eq!(registry.load(), None);

    // The next invocation records its own browser; a live port is trusted
    let replacement = TcpListener::bind("127.0.0.1:0").unwrap();
    let live_port = replacement.local_addr().unwrap().port();
    registry.save(live_port, 10000).unwrap();
    assert_eq!(registry.load_verified(), Some(live_port));
}

#[tokio::test]
async fn test_readiness_polling_respects_budget() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);

    // Nothing will ever listen: the poll must give up after its budget,
    // returning false rather than erroring
    let ready =
        ProcessLauncher::wait_until_ready(dead_port, 5, Duration::from_millis(10)).await;
    assert!(!ready);
}

#[test]
fn test_registry_survives_concurrent_style_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PortRegistry::at(dir.path().join("browser-port"));

    // Writers replace the file atomically, so a reader sees one of the
    // complete records, never a mix
    for pid in 0..20u32 {
        registry.save(9000 + pid as u16, pid).unwrap();
        let port = registry.load().unwrap();
        let read_pid = registry.load_pid().unwrap();
        assert_eq!(port as u32 - 9000, read_pid);
    }
}
