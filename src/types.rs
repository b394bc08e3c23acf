use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strategy used to obtain a live browser handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Launch an ephemeral browser owned by this session
    Fresh,
    /// Attach to an explicit remote-debugging endpoint
    Cdp,
    /// Launch with a user-supplied persistent profile directory
    Profile,
    /// Reuse (or launch) a detached browser shared across invocations
    Persistent,
}

impl SessionMode {
    /// Pick a backend when the caller did not pin one explicitly.
    ///
    /// Headless runs have nothing visible to preserve, so they always get a
    /// fresh browser; headed runs default to the shared detached browser so
    /// consecutive invocations reuse one window instead of flashing a new one
    /// per command.
    pub fn resolve(headless: bool, explicit: Option<SessionMode>) -> SessionMode {
        match explicit {
            Some(mode) => mode,
            None if headless => SessionMode::Fresh,
            None => SessionMode::Persistent,
        }
    }

    /// Whether closing a session in this mode may terminate the browser
    /// process. Attached browsers are never owned by the session.
    pub fn owns_browser(&self) -> bool {
        matches!(self, SessionMode::Fresh | SessionMode::Profile)
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionMode::Fresh => "fresh",
            SessionMode::Cdp => "cdp",
            SessionMode::Profile => "profile",
            SessionMode::Persistent => "persistent",
        };
        write!(f, "{}", name)
    }
}

/// Navigation wait condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// DOM parsed, subresources may still be loading
    #[value(name = "domcontentloaded")]
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// Window load event fired
    Load,
    /// No network activity (falls back to load if the page never goes idle)
    #[value(name = "networkidle")]
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Handle to a detached browser process.
///
/// Not a process *object*: the pid may belong to a process started by an
/// earlier invocation, and the port file shares ownership of the resource
/// with the OS process table. Whichever goes away first, any process that can
/// still attach to the port keeps a usable browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// OS process id of the browser
    pub pid: u32,
    /// CDP remote-debugging port it listens on
    pub port: u16,
}

/// Summary of a registered session, for `session list`
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Registry key
    pub id: String,
    /// Backend the session was created with
    pub mode: SessionMode,
    /// URL of the current page, if one could be read
    pub url: Option<String>,
    /// When the session was established
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
