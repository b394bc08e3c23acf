#[cfg(test)]
mod tests {
    use crate::port_registry::PortRegistry;
    use pretty_assertions::assert_eq;
    use std::net::TcpListener;

    fn scratch_registry(dir: &tempfile::TempDir) -> PortRegistry {
        PortRegistry::at(dir.path().join("browser-port"))
    }

    #[test]
    fn test_load_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);
        assert_eq!(registry.load(), None);
        assert_eq!(registry.load_pid(), None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);

        registry.save(9222, 4242).unwrap();
        assert_eq!(registry.load(), Some(9222));
        assert_eq!(registry.load_pid(), Some(4242));

        // Overwrite replaces, never appends
        registry.save(9333, 4343).unwrap();
        assert_eq!(registry.load(), Some(9333));
        assert_eq!(registry.load_pid(), Some(4343));
    }

    #[test]
    fn test_load_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);
        std::fs::write(registry.path(), "not a port\n").unwrap();
        assert_eq!(registry.load(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);

        // Clearing a missing file must not fail
        registry.clear().unwrap();

        registry.save(9222, 1).unwrap();
        registry.clear().unwrap();
        assert_eq!(registry.load(), None);
        registry.clear().unwrap();
    }

    #[test]
    fn test_verify_live_against_real_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(PortRegistry::verify_live(port));

        // Nothing listens once the socket is dropped
        drop(listener);
        assert!(!PortRegistry::verify_live(port));
    }

    #[test]
    fn test_load_verified_clears_stale_port() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);

        // Record a port nothing listens on (bind then drop to reserve it)
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let dead_port = listener.local_addr().unwrap().port();
        drop(listener);

        registry.save(dead_port, 1).unwrap();
        assert_eq!(registry.load_verified(), None);
        // The stale file must be gone so later reads skip the probe
        assert_eq!(registry.load(), None);
    }

    #[test]
    fn test_load_verified_trusts_live_port() {
        let dir = tempfile::tempdir().unwrap();
        let registry = scratch_registry(&dir);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        registry.save(port, 1).unwrap();

        assert_eq!(registry.load_verified(), Some(port));
        // A live port never clears the file
        assert_eq!(registry.load(), Some(port));
    }
}
