use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the connection layer.
///
/// Each component constructs its own variant directly; nothing downstream
/// re-classifies an error by inspecting message text.
#[derive(Debug, Error)]
pub enum PilotError {
    /// No Chrome/Chromium binary at any well-known location (exit code 6)
    #[error("no Chrome or Chromium executable found (searched: {})", format_paths(.searched))]
    ExecutableNotFound {
        /// Locations that were checked, in order
        searched: Vec<PathBuf>,
    },

    /// The browser process started but its debug port never accepted a
    /// connection within the attempt budget (exit code 4)
    #[error("browser on port {port} did not become reachable after {attempts} attempts")]
    LaunchTimeout { port: u16, attempts: u32 },

    /// A cached or user-given debug endpoint refused the attach (exit code 4)
    #[error("could not attach to browser at {endpoint}: {reason}")]
    AttachFailure { endpoint: String, reason: String },

    /// Navigation failed; carries the raw CDP reason (exit code 1)
    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// A bounded wait exceeded its budget (exit code 5)
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PilotError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PilotError::ExecutableNotFound { .. } => 6,
            PilotError::LaunchTimeout { .. } => 4,
            PilotError::AttachFailure { .. } => 4,
            PilotError::Navigation { .. } => 1,
            PilotError::Timeout { .. } => 5,
        }
    }

    /// Whether a single retry can reasonably succeed. A missing binary cannot
    /// appear by retrying; a slow startup or a stale endpoint can.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            PilotError::LaunchTimeout { .. } | PilotError::AttachFailure { .. }
        )
    }

    /// A hint for the user. For navigation failures the raw CDP reason is the
    /// only signal available, so the hint pattern-matches it; control flow
    /// never does.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            PilotError::ExecutableNotFound { .. } => Some(
                "Install Chrome or Chromium, or pass --cdp-endpoint to attach to a running browser."
                    .to_string(),
            ),
            PilotError::LaunchTimeout { .. } => {
                Some("The browser may be slow to start. Retry, or check for crashed Chrome processes.".to_string())
            }
            PilotError::AttachFailure { .. } => Some(
                "The recorded endpoint is stale. Run `webpilot daemon status`, or retry to launch a new browser."
                    .to_string(),
            ),
            PilotError::Navigation { reason, .. } => {
                let reason = reason.to_lowercase();
                if reason.contains("net::err_name_not_resolved") {
                    Some("Check if the URL is correct and the domain exists.".to_string())
                } else if reason.contains("net::err_connection_refused") {
                    Some("The server refused the connection. Check the URL and port.".to_string())
                } else if reason.contains("timeout") || reason.contains("timed out") {
                    Some("Try increasing --timeout or check if the page is accessible.".to_string())
                } else {
                    None
                }
            }
            PilotError::Timeout { .. } => {
                Some("Try increasing --timeout or check if the page is accessible.".to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
