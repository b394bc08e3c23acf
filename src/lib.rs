//! # webpilot
#![allow(clippy::uninlined_format_args)]
//!
//! CLI tool that drives a Chrome/Chromium browser over the Chrome DevTools
//! Protocol for scraping, testing, and automation.
//!
//! Each invocation is a short-lived process; the crate's core multiplexes
//! those invocations onto a small number of long-lived browser processes:
//!
//! - [`port_registry::PortRegistry`] records the debug port of a shared
//!   detached browser in `~/.webpilot-browser-port` so independent
//!   invocations can find it, re-verifying the port with a real connect
//!   before trusting it.
//! - [`launcher::ProcessLauncher`] finds a browser binary, launches it
//!   detached with an isolated profile, and polls the debug port until it
//!   answers.
//! - [`connection`] holds one strategy per [`types::SessionMode`]: launch an
//!   ephemeral browser, attach to an explicit CDP endpoint, launch with a
//!   persistent profile, or reuse-or-launch the shared detached browser.
//! - [`session::SessionManager`] is the entry point: `acquire(id, ...)`
//!   returns the session registered under the id, establishing it on first
//!   use, and never launches two browsers for one id even under concurrent
//!   acquires.
//!
//! ## CLI usage
//!
//! ```bash
//! # Navigate; consecutive headed invocations reuse one visible window
//! webpilot goto "https://example.com"
//!
//! # Extract text from the page the session is already on
//! webpilot text "h1"
//!
//! # One-shot headless scrape (fresh browser, torn down on exit)
//! webpilot --headless text "h1" --url "https://example.com" --all
//!
//! # Evaluate JavaScript
//! webpilot eval "document.title" --url "https://example.com"
//!
//! # Batch a URL list through a bounded worker pool
//! webpilot --headless batch urls.txt --extract "h1" --concurrency 5
//!
//! # Manage the shared detached browser
//! webpilot daemon start
//! webpilot daemon status
//! webpilot daemon stop
//! ```
//!
//! ## Library usage
//!
//! ```no_run
//! use webpilot::{AcquireOptions, PortRegistry, SessionManager, Settings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let manager = SessionManager::new(Settings::default(), PortRegistry::new()?);
//! let session = manager.acquire("default", &AcquireOptions::default()).await?;
//! session.page().goto("https://example.com").await?;
//! manager.close_all().await;
//! # Ok(())
//! # }
//! ```

/// Thin CLI command handlers
pub mod commands;

/// Connection backends, one strategy per session mode
pub mod connection;

/// Typed errors of the connection layer
pub mod errors;

/// Detached browser process launching
pub mod launcher;

/// Result printing
pub mod output;

/// Page operation helpers
pub mod page;

/// Cross-process browser discovery via the port file
pub mod port_registry;

/// Session registry and manager
pub mod session;

/// Runtime settings
pub mod settings;

/// Shared type definitions
pub mod types;

pub use errors::PilotError;
pub use port_registry::PortRegistry;
pub use session::{AcquireOptions, Session, SessionManager};
pub use settings::Settings;
pub use types::{OutputFormat, ProcessHandle, SessionInfo, SessionMode, WaitUntil};
