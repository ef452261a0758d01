pub mod diagram;
pub mod export;
pub mod prompt;
pub mod run_context;
pub mod schema;
pub mod steps;

use mp_config::MetaportConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Export(args) => export::handle(&args, config, flags).await,
        Commands::Text(args) => steps::text(&args, config, flags),
        Commands::Json(args) => steps::json(&args, config, flags),
        Commands::Tabular(args) => steps::tabular(&args, config, flags),
        Commands::Summary(args) => steps::summary(&args, config, flags),
        Commands::Prompt(args) => prompt::handle(&args, config, flags),
        Commands::Diagram(_) | Commands::Schema(_) => {
            unreachable!("diagram/schema are pre-dispatched in main")
        }
    }
}
