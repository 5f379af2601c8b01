mod serve;
mod show;
mod sync;

use quotesync_warehouse::Warehouse;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::CliError;

/// Dispatch the parsed command; `Some` output is printed as JSON by the caller.
pub async fn run(cli: &Cli, config: &AppConfig) -> Result<Option<Value>, CliError> {
    match &cli.command {
        Command::Sync(args) => sync::run(args, config).await.map(Some),
        Command::Serve(args) => serve::run(args, config).await.map(|()| None),
        Command::Show(args) => show::run(args, config).map(Some),
    }
}

fn open_warehouse(config: &AppConfig) -> Result<Warehouse, CliError> {
    let warehouse = Warehouse::open(config.warehouse_config())?;
    tracing::debug!(db_path = %warehouse.db_path().display(), "warehouse opened");
    Ok(warehouse)
}
