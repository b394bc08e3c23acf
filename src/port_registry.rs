use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// How long a probe connect may take before the port counts as dead
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Records the CDP debug port of the shared detached browser in a well-known
/// file so independent CLI invocations can find it.
///
/// The file is a cache, never a source of truth: a crashed browser leaves the
/// file behind, so every read must be re-verified with a real connect before
/// the port is trusted.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    path: PathBuf,
}

impl PortRegistry {
    /// Registry at the default location, `~/.webpilot-browser-port`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        Ok(PortRegistry {
            path: home.join(".webpilot-browser-port"),
        })
    }

    /// Registry at an explicit path (used by tests)
    pub fn at(path: PathBuf) -> Self {
        PortRegistry { path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the recorded port. None if the file is absent or unparsable.
    pub fn load(&self) -> Option<u16> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        content.lines().next()?.trim().parse().ok()
    }

    /// Read the pid recorded alongside the port, if any
    pub fn load_pid(&self) -> Option<u32> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        content.lines().nth(1)?.trim().parse().ok()
    }

    /// Atomically overwrite the file with the given port and launching pid.
    ///
    /// Write-to-temp-then-rename so a concurrent reader never sees a partial
    /// write.
    pub fn save(&self, port: u16, pid: u32) -> Result<()> {
        let dir = self
            .path
            .parent()
            .context("Port file path has no parent directory")?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary port file")?;
        writeln!(tmp, "{}", port)?;
        writeln!(tmp, "{}", pid)?;
        tmp.persist(&self.path)
            .context("Failed to persist port file")?;

        debug!("Recorded browser port {} (pid {})", port, pid);
        Ok(())
    }

    /// Delete the file. Ok if it was already gone.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove port file"),
        }
    }

    /// Probe whether anything accepts TCP connections on `127.0.0.1:port`.
    /// Refused and timed-out both count as not-live.
    pub fn verify_live(port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok()
    }

    /// Load the recorded port and trust it only after a successful probe.
    ///
    /// A dead port means the file is stale (browser crashed or was killed):
    /// it is cleared so later invocations skip the probe, and None is
    /// returned so the caller launches fresh.
    pub fn load_verified(&self) -> Option<u16> {
        let port = self.load()?;
        if Self::verify_live(port) {
            debug!("Reusing browser on port {}", port);
            return Some(port);
        }

        warn!("Recorded browser port {} is no longer live, clearing", port);
        if let Err(e) = self.clear() {
            warn!("Failed to clear stale port file: {}", e);
        }
        None
    }
}

#[cfg(test)]
#[path = "port_registry_test.rs"]
mod port_registry_test;
