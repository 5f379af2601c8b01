//! One ingestion batch from the configured provider into the warehouse.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use quotesync_core::{
    IngestionOrchestrator, InstrumentBatch, MinIntervalGate, ProviderEndpoints, QuoteFetcher,
    ReqwestHttpClient, RunReport, SessionNegotiator, Symbol, SyncLogRecord, TransportConfig,
    WarehouseError, WarehouseGateway,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::cli::SyncArgs;
use crate::config::AppConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SyncSummary<'a> {
    db_path: String,
    saved: usize,
    skipped: usize,
    sync_log_written: bool,
    #[serde(flatten)]
    report: &'a RunReport,
}

pub async fn run(args: &SyncArgs, config: &AppConfig) -> Result<Value, CliError> {
    let batch = resolve_batch(args, config)?;
    if batch.is_empty() {
        return Err(CliError::Config(String::from("no tickers to sync")));
    }

    let warehouse = Arc::new(super::open_warehouse(config)?);
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.request_interval);
    let batch_size = args.batch_size.unwrap_or(config.batch_size);
    let batch_pause = args
        .batch_pause_ms
        .map(Duration::from_millis)
        .unwrap_or(config.batch_pause);
    let timeout_ms = args.timeout_ms.unwrap_or(config.timeout_ms);

    let http = Arc::new(ReqwestHttpClient::new(&TransportConfig::default())?);
    let endpoints = ProviderEndpoints::default();
    let mut orchestrator = IngestionOrchestrator::new(
        SessionNegotiator::new(http.clone(), endpoints.clone()).with_timeout_ms(timeout_ms),
        QuoteFetcher::new(http, endpoints).with_timeout_ms(timeout_ms),
        Arc::new(WarehouseGateway::new(warehouse.clone())),
        Box::new(MinIntervalGate::new(interval).with_batch_pause(batch_size, batch_pause)),
    );

    let report = orchestrator.run(&batch).await?;

    let sync_log_written = write_sync_log(&report, |run_id, records| {
        warehouse.record_sync_log(run_id, records)
    });

    if let Some(path) = &args.failed_out {
        let skipped = report.skipped_symbols();
        if !skipped.is_empty() {
            warn!(count = skipped.len(), path = %path.display(), "writing skipped tickers");
        }
        fs::write(path, failed_listing(&skipped))?;
    }

    let summary = SyncSummary {
        db_path: warehouse.db_path().display().to_string(),
        saved: report.saved(),
        skipped: report.skipped(),
        sync_log_written,
        report: &report,
    };
    Ok(serde_json::to_value(summary)?)
}

/// Positional tickers first, then the tickers file; the configured list only
/// when neither is given.
fn resolve_batch(args: &SyncArgs, config: &AppConfig) -> Result<InstrumentBatch, CliError> {
    let mut symbols = InstrumentBatch::parse(&args.tickers)?.symbols().to_vec();

    if let Some(path) = &args.tickers_file {
        let text = fs::read_to_string(path)?;
        symbols.extend(InstrumentBatch::from_listing_text(&text)?.symbols().iter().cloned());
    }

    if args.tickers.is_empty() && args.tickers_file.is_none() {
        return Ok(InstrumentBatch::parse(&config.tickers)?);
    }

    Ok(InstrumentBatch::new(symbols))
}

/// The audit trail is best effort: a storage failure here is logged and the
/// finished run still succeeds.
fn write_sync_log<W>(report: &RunReport, write: W) -> bool
where
    W: FnOnce(&str, &[SyncLogRecord]) -> Result<(), WarehouseError>,
{
    let run_id = report.run_id.to_string();
    match write(&run_id, &report.sync_log_records()) {
        Ok(()) => true,
        Err(e) => {
            error!(%run_id, error = %e, "failed to write sync log");
            false
        }
    }
}

fn failed_listing(skipped: &[&Symbol]) -> String {
    skipped
        .iter()
        .map(|symbol| format!("{symbol}\n"))
        .collect()
}
