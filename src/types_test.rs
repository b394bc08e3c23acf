#[cfg(test)]
mod tests {
    use crate::types::{ProcessHandle, SessionMode, WaitUntil};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_tie_break() {
        // Headless with no pinned mode always gets a fresh browser
        assert_eq!(SessionMode::resolve(true, None), SessionMode::Fresh);
        // Headed defaults to the shared detached browser
        assert_eq!(SessionMode::resolve(false, None), SessionMode::Persistent);
    }

    #[test]
    fn test_explicit_mode_wins_over_tie_break() {
        assert_eq!(
            SessionMode::resolve(true, Some(SessionMode::Persistent)),
            SessionMode::Persistent
        );
        assert_eq!(
            SessionMode::resolve(false, Some(SessionMode::Fresh)),
            SessionMode::Fresh
        );
        assert_eq!(
            SessionMode::resolve(false, Some(SessionMode::Profile)),
            SessionMode::Profile
        );
    }

    #[test]
    fn test_ownership_per_mode() {
        assert!(SessionMode::Fresh.owns_browser());
        assert!(SessionMode::Profile.owns_browser());
        assert!(!SessionMode::Cdp.owns_browser());
        assert!(!SessionMode::Persistent.owns_browser());
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&SessionMode::Persistent).unwrap();
        assert_eq!(json, "\"persistent\"");

        let mode: SessionMode = serde_json::from_str("\"fresh\"").unwrap();
        assert_eq!(mode, SessionMode::Fresh);
    }

    #[test]
    fn test_wait_until_serialization() {
        let json = serde_json::to_string(&WaitUntil::DomContentLoaded).unwrap();
        assert_eq!(json, "\"domcontentloaded\"");

        let wait: WaitUntil = serde_json::from_str("\"networkidle\"").unwrap();
        assert_eq!(wait, WaitUntil::NetworkIdle);
    }

    #[test]
    fn test_process_handle_roundtrip() {
        let handle = ProcessHandle {
            pid: 4242,
            port: 9222,
        };
        let json = serde_json::to_string(&handle).unwrap();
        let parsed: ProcessHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, handle);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(SessionMode::Fresh.to_string(), "fresh");
        assert_eq!(SessionMode::Persistent.to_string(), "persistent");
    }
}
