use anyhow::Result;
use serde_json::json;

use crate::output::print_result;
use crate::port_registry::PortRegistry;
use crate::session::SessionManager;

/// Report the state of the shared browser record and this process's registry
pub async fn handle_status(manager: &SessionManager) -> Result<()> {
    let registry = manager.port_registry();
    let recorded_port = registry.load();
    let live = recorded_port.map(PortRegistry::verify_live).unwrap_or(false);

    let result = json!({
        "port_file": registry.path().display().to_string(),
        "recorded_port": recorded_port,
        "recorded_pid": registry.load_pid(),
        "browser_live": live,
        "sessions": manager.len(),
    });
    print_result(&result, manager.settings().format);
    Ok(())
}
