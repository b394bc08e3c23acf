#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webpilot::commands;
use webpilot::commands::daemon::DaemonCommands;
use webpilot::commands::session::SessionCommands;
use webpilot::errors::PilotError;
use webpilot::port_registry::PortRegistry;
use webpilot::session::{AcquireOptions, SessionManager};
use webpilot::settings::Settings;
use webpilot::types::{OutputFormat, SessionMode, WaitUntil};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_COMMAND_ERROR: i32 = 1;

#[derive(Parser)]
#[command(name = "webpilot", version)]
#[command(about = "Drive a Chrome/Chromium browser over CDP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session id; invocations sharing an id reuse one browser surface
    #[arg(long, global = true, default_value = "default")]
    session: String,

    /// Run without a visible browser window
    #[arg(long, global = true)]
    headless: bool,

    /// Timeout for page operations in milliseconds
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout: u64,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    format: OutputFormat,

    /// Pin a connection backend instead of the headless/headed default
    #[arg(long, global = true)]
    mode: Option<SessionMode>,

    /// Debug endpoint for --mode cdp (e.g. http://127.0.0.1:9222)
    #[arg(long, global = true)]
    cdp_endpoint: Option<String>,

    /// Persistent profile directory for --mode profile
    #[arg(long, global = true)]
    profile_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate the session's page to a URL
    Goto {
        /// URL to open
        url: String,

        /// Wait condition for the navigation
        #[arg(long, default_value = "domcontentloaded")]
        wait_until: WaitUntil,
    },

    /// Extract text content from elements matching a selector
    Text {
        /// CSS selector
        selector: String,

        /// Navigate here first (otherwise the session's current page is used)
        #[arg(long)]
        url: Option<String>,

        /// Return all matches instead of just the first
        #[arg(long)]
        all: bool,
    },

    /// Evaluate a JavaScript expression and print its JSON value
    Eval {
        /// Expression to evaluate
        expression: String,

        /// Navigate here first
        #[arg(long)]
        url: Option<String>,
    },

    /// Capture the page as a PNG file
    Screenshot {
        /// Navigate here first
        #[arg(long)]
        url: Option<String>,

        /// Output file path
        #[arg(short, long, default_value = "screenshot.png")]
        output: String,

        /// Capture the full scrollable page
        #[arg(long)]
        full_page: bool,
    },

    /// Process a file of URLs through a bounded worker pool
    Batch {
        /// File containing URLs, one per line
        file: String,

        /// Selector to extract from each page (title is reported otherwise)
        #[arg(short, long)]
        extract: Option<String>,

        /// Number of URLs in flight at once
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,
    },

    /// Manage sessions registered in this process
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Manage the shared detached browser
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Show the shared browser record and registry state
    Status,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            // The connection layer produces typed errors; everything else
            // exits generically.
            let (message, exit_code, suggestion) = match err.downcast_ref::<PilotError>() {
                Some(e) => (e.to_string(), e.exit_code(), e.suggestion()),
                None => (err.to_string(), EXIT_COMMAND_ERROR, None),
            };

            // JSON to stdout for programmatic consumers, prose to stderr
            let mut error_json = json!({
                "error": true,
                "message": message,
                "exit_code": exit_code,
            });
            if let Some(s) = &suggestion {
                error_json["suggestion"] = json!(s);
            }
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            eprintln!("Error: {}", message);
            if let Some(s) = suggestion {
                eprintln!("Suggestion: {}", s);
            }
            std::process::exit(exit_code);
        }
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webpilot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings {
        headless: cli.headless,
        timeout_ms: cli.timeout,
        format: cli.format,
    };
    let manager = Arc::new(SessionManager::new(settings, PortRegistry::new()?));

    // A user interrupt exits immediately without further browser traffic.
    // Shared detached browsers survive by construction (separate process
    // group).
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_SUCCESS);
        }
    });

    let acquire = AcquireOptions {
        headless: None,
        mode: cli.mode,
        cdp_endpoint: cli.cdp_endpoint.clone(),
        profile_dir: cli.profile_dir.clone(),
    };
    let session_id = cli.session.clone();

    let result = match cli.command {
        Commands::Goto { url, wait_until } => {
            commands::navigate::handle_goto(&manager, &session_id, url, wait_until, acquire).await
        }
        Commands::Text { selector, url, all } => {
            commands::extract::handle_text(&manager, &session_id, selector, url, all, acquire)
                .await
        }
        Commands::Eval { expression, url } => {
            commands::eval::handle_eval(&manager, &session_id, expression, url, acquire).await
        }
        Commands::Screenshot {
            url,
            output,
            full_page,
        } => {
            commands::screenshot::handle_screenshot(
                &manager,
                &session_id,
                url,
                output,
                full_page,
                acquire,
            )
            .await
        }
        Commands::Batch {
            file,
            extract,
            concurrency,
        } => {
            commands::batch::handle_urls(
                manager.clone(),
                &session_id,
                file,
                extract,
                concurrency,
                acquire,
            )
            .await
        }
        Commands::Session { command } => commands::session::handle_session(&manager, command).await,
        Commands::Daemon { command } => commands::daemon::handle_daemon(&manager, command).await,
        Commands::Status => commands::status::handle_status(&manager).await,
    };

    // Process-wide shutdown: owned browsers terminate, shared ones are only
    // detached from.
    manager.close_all().await;

    result
}
