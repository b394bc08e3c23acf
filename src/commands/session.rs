use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use tracing::info;

use crate::output::print_result;
use crate::session::SessionManager;

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List sessions registered in this process
    List,

    /// Close one session (shared browsers are only detached from)
    Close {
        /// Session id
        id: String,
    },

    /// Close every registered session
    CloseAll,
}

pub async fn handle_session(manager: &SessionManager, command: SessionCommands) -> Result<()> {
    match command {
        SessionCommands::List => {
            let sessions = manager.list().await;
            print_result(&sessions, manager.settings().format);
        }
        SessionCommands::Close { id } => {
            info!("Closing session '{}'", id);
            let existed = manager.get(&id).is_some();
            manager.close(&id).await;
            let result = json!({
                "session": id,
                "closed": existed,
            });
            print_result(&result, manager.settings().format);
        }
        SessionCommands::CloseAll => {
            let count = manager.len();
            manager.close_all().await;
            let result = json!({ "closed": count });
            print_result(&result, manager.settings().format);
        }
    }
    Ok(())
}
