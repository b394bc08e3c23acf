#[cfg(test)]
mod tests {
    use crate::launcher::ProcessLauncher;
    use std::path::Path;
    use std::time::{Duration, Instant};

    #[test]
    fn test_executable_candidates_not_empty() {
        assert!(!ProcessLauncher::executable_candidates().is_empty());
    }

    #[test]
    fn test_find_free_port_is_bindable() {
        let port = ProcessLauncher::find_free_port().unwrap();
        assert!(port > 0);
        // The port is actually free at the time of the probe
        std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn test_launch_args_flag_set() {
        let args = ProcessLauncher::launch_args(false, 9222, Path::new("/tmp/profile"));

        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--no-first-run".to_string()));
        assert!(args.contains(&"--disable-extensions".to_string()));
        assert!(args.contains(&"--mute-audio".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));

        let headless_args = ProcessLauncher::launch_args(true, 9222, Path::new("/tmp/profile"));
        assert!(headless_args.contains(&"--headless=new".to_string()));
    }

    #[tokio::test]
    async fn test_wait_until_ready_exhausts_attempt_budget() {
        // Reserve a port and drop the listener so nothing will ever answer
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead_port = listener.local_addr().unwrap().port();
        drop(listener);

        let interval = Duration::from_millis(10);
        let start = Instant::now();
        let ready = ProcessLauncher::wait_until_ready(dead_port, 3, interval).await;

        assert!(!ready);
        // 3 attempts sleep twice between probes; it must not spin forever
        assert!(start.elapsed() >= interval * 2);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wait_until_ready_detects_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let ready = ProcessLauncher::wait_until_ready(port, 3, Duration::from_millis(10)).await;
        assert!(ready);
    }

    #[test]
    fn test_scratch_profile_dir_exists() {
        let dir = ProcessLauncher::scratch_profile_dir().unwrap();
        assert!(dir.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
