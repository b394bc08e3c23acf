use std::path::Path;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::Handler;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::PilotError;
use crate::launcher::ProcessLauncher;
use crate::port_registry::PortRegistry;
use crate::types::{ProcessHandle, SessionMode};

/// Readiness budget for a freshly launched detached browser
const READY_ATTEMPTS: u32 = 20;
const READY_INTERVAL: Duration = Duration::from_millis(500);

/// Budget for the CDP websocket handshake itself
const ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

/// A live browser connection as produced by one of the backends.
///
/// `process` is present only when this invocation launched the detached
/// process; its absence means some other invocation (or the user) owns it.
pub struct Connection {
    pub browser: Browser,
    pub page: Page,
    pub handler: JoinHandle<()>,
    pub process: Option<ProcessHandle>,
    /// Scratch profile directory to remove once the owned browser is closed
    pub scratch_profile: Option<std::path::PathBuf>,
}

/// Caller-supplied knobs for establishing a connection
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub headless: bool,
    /// Explicit debug endpoint, required for [`SessionMode::Cdp`]
    pub cdp_endpoint: Option<String>,
    /// Persistent profile directory, required for [`SessionMode::Profile`]
    pub profile_dir: Option<std::path::PathBuf>,
}

/// Establish a connection using the strategy for `mode`
pub async fn connect(
    mode: SessionMode,
    opts: &ConnectOptions,
    registry: &PortRegistry,
) -> Result<Connection, PilotError> {
    match mode {
        SessionMode::Fresh => connect_fresh(opts.headless).await,
        SessionMode::Cdp => {
            let endpoint =
                opts.cdp_endpoint
                    .as_deref()
                    .ok_or_else(|| PilotError::AttachFailure {
                        endpoint: "(none)".to_string(),
                        reason: "cdp mode requires --cdp-endpoint".to_string(),
                    })?;
            connect_cdp(endpoint).await
        }
        SessionMode::Profile => {
            let dir = opts
                .profile_dir
                .as_deref()
                .ok_or_else(|| PilotError::AttachFailure {
                    endpoint: "(none)".to_string(),
                    reason: "profile mode requires --profile-dir".to_string(),
                })?;
            connect_profile(opts.headless, dir).await
        }
        SessionMode::Persistent => connect_persistent(opts.headless, registry).await,
    }
}

/// Launch an ephemeral browser owned by the session. Closing it always
/// terminates the process.
async fn connect_fresh(headless: bool) -> Result<Connection, PilotError> {
    let executable = ProcessLauncher::find_executable()?;
    let profile_dir =
        ProcessLauncher::scratch_profile_dir().map_err(|e| PilotError::AttachFailure {
            endpoint: "local launch".to_string(),
            reason: e.to_string(),
        })?;

    let (browser, handler) = launch_browser(&executable, headless, &profile_dir).await?;
    let handler = spawn_handler(handler);
    let page = first_page(&browser).await?;

    debug!("Launched ephemeral browser");
    Ok(Connection {
        browser,
        page,
        handler,
        process: None,
        scratch_profile: Some(profile_dir),
    })
}

/// Launch with a user-supplied persistent profile directory so cookies and
/// storage survive across runs. Closing terminates the browser; the profile
/// directory stays.
async fn connect_profile(headless: bool, profile_dir: &Path) -> Result<Connection, PilotError> {
    let executable = ProcessLauncher::find_executable()?;

    let (browser, handler) = launch_browser(&executable, headless, profile_dir).await?;
    let handler = spawn_handler(handler);
    let page = first_page(&browser).await?;

    debug!("Launched browser with profile {}", profile_dir.display());
    Ok(Connection {
        browser,
        page,
        handler,
        process: None,
        scratch_profile: None,
    })
}

/// Attach to an already-running browser over CDP. The remote browser is not
/// owned: detaching never terminates it.
async fn connect_cdp(endpoint: &str) -> Result<Connection, PilotError> {
    let ws_url = websocket_url(endpoint).await?;

    let (browser, handler) = timeout(ATTACH_TIMEOUT, Browser::connect(ws_url.clone()))
        .await
        .map_err(|_| PilotError::AttachFailure {
            endpoint: endpoint.to_string(),
            reason: format!("handshake exceeded {}s", ATTACH_TIMEOUT.as_secs()),
        })?
        .map_err(|e| PilotError::AttachFailure {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    let handler = spawn_handler(handler);
    let page = first_page(&browser).await?;

    debug!("Attached to browser at {}", endpoint);
    Ok(Connection {
        browser,
        page,
        handler,
        process: None,
        scratch_profile: None,
    })
}

/// The composite strategy: reuse the recorded detached browser if its port is
/// still live, otherwise launch a new one, record it, and attach.
///
/// There is no lock on the port file. Two invocations that both see a stale
/// file will both launch; the loser's browser becomes an orphan on its own
/// port, but each invocation still ends up with a working session. Accepted
/// best-effort behavior.
async fn connect_persistent(
    headless: bool,
    registry: &PortRegistry,
) -> Result<Connection, PilotError> {
    if let Some(port) = registry.load_verified() {
        let endpoint = format!("http://127.0.0.1:{}", port);
        match connect_cdp(&endpoint).await {
            Ok(conn) => {
                info!("Reusing detached browser on port {}", port);
                return Ok(conn);
            }
            Err(e) => {
                // Live TCP port but no usable CDP endpoint: something else
                // squatted the port. Treat the record as stale.
                warn!("Attach to recorded port {} failed ({}), relaunching", port, e);
                if let Err(e) = registry.clear() {
                    warn!("Failed to clear stale port file: {}", e);
                }
            }
        }
    }

    let port = ProcessLauncher::find_free_port().map_err(|e| PilotError::AttachFailure {
        endpoint: "port allocation".to_string(),
        reason: e.to_string(),
    })?;
    let profile_dir =
        ProcessLauncher::scratch_profile_dir().map_err(|e| PilotError::AttachFailure {
            endpoint: "local launch".to_string(),
            reason: e.to_string(),
        })?;

    let handle = ProcessLauncher::launch(headless, port, &profile_dir)?;

    if !ProcessLauncher::wait_until_ready(port, READY_ATTEMPTS, READY_INTERVAL).await {
        return Err(PilotError::LaunchTimeout {
            port,
            attempts: READY_ATTEMPTS,
        });
    }

    if let Err(e) = registry.save(port, handle.pid) {
        // The browser is up and usable by this invocation either way; only
        // cross-process reuse is lost.
        warn!("Failed to record browser port {}: {}", port, e);
    }

    let endpoint = format!("http://127.0.0.1:{}", port);
    let mut conn = connect_cdp(&endpoint).await?;
    conn.process = Some(handle);

    info!("Started detached browser on port {} (pid {})", port, handle.pid);
    Ok(conn)
}

async fn launch_browser(
    executable: &Path,
    headless: bool,
    profile_dir: &Path,
) -> Result<(Browser, Handler), PilotError> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(executable)
        .user_data_dir(profile_dir);
    if !headless {
        builder = builder.with_head();
    }
    let config = builder.build().map_err(|e| PilotError::AttachFailure {
        endpoint: "local launch".to_string(),
        reason: e,
    })?;

    Browser::launch(config)
        .await
        .map_err(|e| PilotError::AttachFailure {
            endpoint: "local launch".to_string(),
            reason: e.to_string(),
        })
}

/// Drive the CDP event stream for the connection's lifetime. The task ends
/// when the websocket drops or the session aborts it.
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}

/// Reuse the first existing page if present, else open one
async fn first_page(browser: &Browser) -> Result<Page, PilotError> {
    let pages = browser.pages().await.map_err(|e| PilotError::AttachFailure {
        endpoint: "page listing".to_string(),
        reason: e.to_string(),
    })?;
    if let Some(page) = pages.into_iter().next() {
        return Ok(page);
    }
    browser
        .new_page("about:blank")
        .await
        .map_err(|e| PilotError::AttachFailure {
            endpoint: "page creation".to_string(),
            reason: e.to_string(),
        })
}

#[derive(Deserialize)]
struct JsonVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Resolve the websocket debugger URL for an endpoint. An explicit `ws://`
/// URL passes through; an `http://host:port` endpoint is asked via
/// `/json/version`.
async fn websocket_url(endpoint: &str) -> Result<String, PilotError> {
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        return Ok(endpoint.to_string());
    }

    let url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| PilotError::AttachFailure {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PilotError::AttachFailure {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    if !resp.status().is_success() {
        return Err(PilotError::AttachFailure {
            endpoint: endpoint.to_string(),
            reason: format!("/json/version returned {}", resp.status()),
        });
    }

    let version: JsonVersion = resp.json().await.map_err(|e| PilotError::AttachFailure {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    Ok(version.web_socket_debugger_url)
}
