use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::PilotError;
use crate::launcher::ProcessLauncher;
use crate::output::print_result;
use crate::port_registry::PortRegistry;
use crate::session::SessionManager;

const READY_ATTEMPTS: u32 = 20;
const READY_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Subcommand)]
pub enum DaemonCommands {
    /// Start the shared detached browser
    Start {
        /// Debug port to listen on (a free port is picked if omitted)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Stop the shared detached browser and clear its record
    Stop,

    /// Report whether the shared detached browser is reachable
    Status,
}

/// Manage the shared detached browser outside any one session.
///
/// `stop` is the only way the persistent backend's browser ever terminates on
/// purpose: closing persistent sessions always leaves it running.
pub async fn handle_daemon(manager: &SessionManager, command: DaemonCommands) -> Result<()> {
    let registry = manager.port_registry();
    let format = manager.settings().format;

    match command {
        DaemonCommands::Start { port } => {
            if let Some(existing) = registry.load_verified() {
                let result = json!({
                    "message": "Browser already running",
                    "port": existing,
                    "cdp_endpoint": format!("http://127.0.0.1:{}", existing),
                });
                print_result(&result, format);
                return Ok(());
            }

            let port = match port {
                Some(p) => p,
                None => ProcessLauncher::find_free_port()?,
            };
            let profile_dir = ProcessLauncher::scratch_profile_dir()?;
            let handle =
                ProcessLauncher::launch(manager.settings().headless, port, &profile_dir)?;

            if !ProcessLauncher::wait_until_ready(port, READY_ATTEMPTS, READY_INTERVAL).await {
                return Err(PilotError::LaunchTimeout {
                    port,
                    attempts: READY_ATTEMPTS,
                }
                .into());
            }
            registry.save(port, handle.pid)?;

            info!("Detached browser started on port {}", port);
            let result = json!({
                "message": "Browser started",
                "port": port,
                "pid": handle.pid,
                "cdp_endpoint": format!("http://127.0.0.1:{}", port),
            });
            print_result(&result, format);
        }

        DaemonCommands::Stop => {
            let port = registry.load();
            let pid = registry.load_pid();

            let Some(pid) = pid else {
                let result = json!({ "message": "No browser recorded" });
                print_result(&result, format);
                return Ok(());
            };

            if terminate(pid) {
                info!("Stopped detached browser (pid {})", pid);
                let result = json!({
                    "message": "Browser stopped",
                    "pid": pid,
                    "port": port,
                });
                print_result(&result, format);
            } else {
                warn!("Recorded browser pid {} was not running", pid);
                let result = json!({
                    "message": "Browser process not found, clearing stale record",
                    "pid": pid,
                });
                print_result(&result, format);
            }
            registry.clear()?;
        }

        DaemonCommands::Status => {
            let result = match registry.load() {
                Some(port) if PortRegistry::verify_live(port) => json!({
                    "status": "running",
                    "port": port,
                    "pid": registry.load_pid(),
                    "cdp_endpoint": format!("http://127.0.0.1:{}", port),
                }),
                Some(port) => {
                    // Stale record; clean up so the next acquire skips the
                    // probe
                    registry.clear()?;
                    json!({
                        "status": "stopped",
                        "note": format!("recorded port {} is no longer live", port),
                    })
                }
                None => json!({ "status": "stopped" }),
            };
            print_result(&result, format);
        }
    }
    Ok(())
}

/// Send a termination signal to the recorded browser process. Returns false
/// if no such process exists.
#[cfg(unix)]
fn terminate(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
}

#[cfg(windows)]
fn terminate(pid: u32) -> bool {
    std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
