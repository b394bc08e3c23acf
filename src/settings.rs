use crate::types::OutputFormat;

/// Runtime settings resolved once from CLI flags and threaded into the
/// session manager and command handlers. There is deliberately no global
/// instance; tests construct their own.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Run browsers without a visible window
    pub headless: bool,
    /// Default budget for page operations, in milliseconds
    pub timeout_ms: u64,
    /// How command results are printed
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            // Headed by default: session reuse across invocations is the
            // common case, and it needs a window worth preserving.
            headless: false,
            timeout_ms: 30_000,
            format: OutputFormat::Json,
        }
    }
}
