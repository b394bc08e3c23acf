use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::errors::PilotError;
use crate::port_registry::PortRegistry;
use crate::types::ProcessHandle;

/// Launches detached Chrome/Chromium processes for the persistent backend.
///
/// The launched process is not a child whose exit is awaited: it is expected
/// to outlive this invocation and be discovered by later ones through the
/// port file.
pub struct ProcessLauncher;

impl ProcessLauncher {
    /// Well-known install locations, checked in order
    pub fn executable_candidates() -> Vec<PathBuf> {
        if cfg!(target_os = "macos") {
            vec![
                PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
                PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
            ]
        } else if cfg!(target_os = "windows") {
            let mut paths = Vec::new();
            for var in ["ProgramFiles", "ProgramFiles(x86)", "LocalAppData"] {
                if let Ok(base) = std::env::var(var) {
                    paths.push(
                        PathBuf::from(base).join("Google/Chrome/Application/chrome.exe"),
                    );
                }
            }
            paths
        } else {
            vec![
                PathBuf::from("/usr/bin/google-chrome"),
                PathBuf::from("/usr/bin/google-chrome-stable"),
                PathBuf::from("/usr/bin/chromium-browser"),
                PathBuf::from("/usr/bin/chromium"),
            ]
        }
    }

    /// First existing candidate. A missing binary is fatal and reported with
    /// the searched locations; retrying cannot help.
    pub fn find_executable() -> Result<PathBuf, PilotError> {
        let candidates = Self::executable_candidates();
        for path in &candidates {
            if path.exists() {
                debug!("Found browser executable at {}", path.display());
                return Ok(path.clone());
            }
        }
        Err(PilotError::ExecutableNotFound {
            searched: candidates,
        })
    }

    /// The deterministic flag set every detached launch uses
    pub fn launch_args(headless: bool, port: u16, profile_dir: &Path) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", port),
            format!("--user-data-dir={}", profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-popup-blocking".to_string(),
            "--disable-translate".to_string(),
            "--disable-extensions".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-default-apps".to_string(),
            "--mute-audio".to_string(),
            "--hide-scrollbars".to_string(),
        ];
        if headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    /// Start a detached browser on `port` with an isolated profile directory.
    ///
    /// Output is discarded and the process handle is released immediately;
    /// readiness is the caller's problem (see [`Self::wait_until_ready`]).
    pub fn launch(
        headless: bool,
        port: u16,
        profile_dir: &Path,
    ) -> Result<ProcessHandle, PilotError> {
        let executable = Self::find_executable()?;
        let args = Self::launch_args(headless, port, profile_dir);

        info!(
            "Launching {} on debug port {}",
            executable.display(),
            port
        );

        let mut cmd = Command::new(&executable);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // New process group so a Ctrl-C aimed at the CLI never reaches the
        // shared browser.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| PilotError::AttachFailure {
            endpoint: format!("launch of {}", executable.display()),
            reason: e.to_string(),
        })?;

        let pid = child.id();
        // Deliberately not awaited: the process must outlive this invocation.
        drop(child);

        Ok(ProcessHandle { pid, port })
    }

    /// Poll until something accepts connections on `port`, at a fixed
    /// interval, for at most `max_attempts` probes. Exhaustion returns false
    /// rather than an error; the caller decides whether that is retryable.
    pub async fn wait_until_ready(port: u16, max_attempts: u32, interval: Duration) -> bool {
        for attempt in 1..=max_attempts {
            if PortRegistry::verify_live(port) {
                debug!("Port {} became ready on attempt {}", port, attempt);
                return true;
            }
            if attempt < max_attempts {
                sleep(interval).await;
            }
        }
        false
    }

    /// Ask the OS for an unused port
    pub fn find_free_port() -> Result<u16> {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").context("Failed to bind probe socket")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    /// Create an isolated scratch profile directory for a detached launch.
    ///
    /// The directory is leaked on purpose: the browser it backs outlives this
    /// process, so cleanup belongs to `daemon stop` or the OS temp reaper.
    pub fn scratch_profile_dir() -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("webpilot-chrome-")
            .tempdir()
            .context("Failed to create browser profile directory")?;
        Ok(dir.keep())
    }
}

#[cfg(test)]
#[path = "launcher_test.rs"]
mod launcher_test;
