use quotesync_core::Symbol;
use serde_json::Value;

use crate::cli::ShowArgs;
use crate::config::AppConfig;
use crate::error::CliError;

pub fn run(args: &ShowArgs, config: &AppConfig) -> Result<Value, CliError> {
    let warehouse = super::open_warehouse(config)?;

    match &args.ticker {
        Some(raw) => {
            let symbol = Symbol::parse(raw)?;
            let row = warehouse
                .get_asset(symbol.as_str())?
                .ok_or_else(|| CliError::NotFound(symbol.to_string()))?;
            Ok(serde_json::to_value(row)?)
        }
        None => Ok(serde_json::to_value(warehouse.list_assets()?)?),
    }
}
