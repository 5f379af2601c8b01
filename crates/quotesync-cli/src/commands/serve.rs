use std::sync::Arc;

use quotesync_api::app_router;
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, config: &AppConfig) -> Result<(), CliError> {
    let warehouse = Arc::new(super::open_warehouse(config)?);
    let addr = args.listen.unwrap_or(config.listen_addr);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, db_path = %warehouse.db_path().display(), "read api listening");

    axum::serve(listener, app_router(warehouse))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
