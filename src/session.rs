use std::path::PathBuf;
use std::sync::Arc;

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::{self, ConnectOptions, Connection};
use crate::errors::PilotError;
use crate::port_registry::PortRegistry;
use crate::settings::Settings;
use crate::types::{ProcessHandle, SessionInfo, SessionMode};

/// One addressable browser surface, keyed by a caller-supplied id.
///
/// The browser handle is exclusively owned for `Fresh` and `Profile`
/// sessions. For `Cdp` and `Persistent` sessions the underlying OS process is
/// shared with other invocations, so closing the session only detaches.
#[derive(Debug)]
pub struct Session {
    id: String,
    mode: SessionMode,
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    process: Option<ProcessHandle>,
    scratch_profile: Option<PathBuf>,
    created_at: DateTime<Utc>,
}

impl Session {
    fn from_connection(id: String, mode: SessionMode, conn: Connection) -> Self {
        Session {
            id,
            mode,
            browser: Mutex::new(conn.browser),
            page: conn.page,
            handler: conn.handler,
            process: conn.process,
            scratch_profile: conn.scratch_profile,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The current page. Commands drive the browser exclusively through this.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// The detached process this invocation launched, if any
    pub fn process(&self) -> Option<ProcessHandle> {
        self.process
    }

    pub async fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            mode: self.mode,
            url: crate::page::current_url(&self.page).await,
            created_at: self.created_at,
        }
    }

    /// Mode-specific teardown. Owned browsers are terminated; shared ones are
    /// only detached from, so other invocations keep using them.
    async fn close(&self) {
        if self.mode.owns_browser() {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!("Error closing browser for session '{}': {}", self.id, e);
            }
            let _ = browser.wait().await;
            if let Some(dir) = &self.scratch_profile {
                let _ = std::fs::remove_dir_all(dir);
            }
        }
        self.handler.abort();
        debug!("Closed session '{}' ({})", self.id, self.mode);
    }
}

/// In-memory session registry and the public entry point for acquiring
/// browser connections.
///
/// Constructed once at process start and passed to command handlers; there is
/// no global instance. The registry only spans this process — cross-process
/// reuse happens through the persistent backend's port file.
pub struct SessionManager {
    settings: Settings,
    registry: PortRegistry,
    sessions: DashMap<String, Arc<Session>>,
    /// Per-id locks so concurrent acquires of one id launch exactly one
    /// browser
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Per-acquire overrides on top of [`Settings`]
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    /// Override the settings-level headless flag
    pub headless: Option<bool>,
    /// Pin a backend instead of the headless/headed tie-break
    pub mode: Option<SessionMode>,
    /// Debug endpoint for [`SessionMode::Cdp`]
    pub cdp_endpoint: Option<String>,
    /// Profile directory for [`SessionMode::Profile`]
    pub profile_dir: Option<PathBuf>,
}

impl SessionManager {
    pub fn new(settings: Settings, registry: PortRegistry) -> Self {
        SessionManager {
            settings,
            registry,
            sessions: DashMap::new(),
            creation_locks: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn port_registry(&self) -> &PortRegistry {
        &self.registry
    }

    /// Get the session for `id`, establishing it on first use.
    ///
    /// An existing session is returned as-is: acquiring never re-navigates or
    /// otherwise resets state. A failed establishment is not cached; the next
    /// acquire for the id starts over.
    pub async fn acquire(
        &self,
        id: &str,
        opts: &AcquireOptions,
    ) -> Result<Arc<Session>, PilotError> {
        if let Some(existing) = self.sessions.get(id) {
            debug!("Reusing session '{}'", id);
            return Ok(existing.clone());
        }

        // Serialize creation per id. Losers of the race block here, then find
        // the winner's session on the re-check.
        let lock = self
            .creation_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(existing) = self.sessions.get(id) {
            debug!("Session '{}' was created while waiting", id);
            return Ok(existing.clone());
        }

        let headless = opts.headless.unwrap_or(self.settings.headless);
        let mode = SessionMode::resolve(headless, opts.mode);
        info!("Establishing session '{}' via {} backend", id, mode);

        let connect_opts = ConnectOptions {
            headless,
            cdp_endpoint: opts.cdp_endpoint.clone(),
            profile_dir: opts.profile_dir.clone(),
        };
        let conn = match connection::connect(mode, &connect_opts, &self.registry).await {
            Ok(conn) => conn,
            // A slow or wedged launch of the shared browser gets one clean
            // retry, never a loop.
            Err(e) if mode == SessionMode::Persistent && e.retryable() => {
                warn!("{}; clearing the port record and retrying once", e);
                if let Err(e) = self.registry.clear() {
                    warn!("Failed to clear port file before retry: {}", e);
                }
                connection::connect(mode, &connect_opts, &self.registry).await?
            }
            Err(e) => return Err(e),
        };

        let session = Arc::new(Session::from_connection(id.to_string(), mode, conn));
        self.sessions.insert(id.to_string(), session.clone());
        Ok(session)
    }

    /// Look up an existing session without establishing one
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close and deregister one session. Absent ids are a no-op.
    pub async fn close(&self, id: &str) {
        if let Some((_, session)) = self.sessions.remove(id) {
            session.close().await;
            info!("Session '{}' closed", id);
        }
    }

    /// Close every registered session. Shutdown path only.
    pub async fn close_all(&self) {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.close(&id).await;
        }
    }

    /// Summaries of all registered sessions
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions: Vec<Arc<Session>> = self.sessions.iter().map(|e| e.value().clone()).collect();
        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            infos.push(session.info().await);
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

// No Drop teardown: sessions owning a browser close it explicitly through
// close/close_all, and shared browsers must survive this process anyway.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
