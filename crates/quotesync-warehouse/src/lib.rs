//! # Quotesync Warehouse
//!
//! DuckDB-backed storage for the latest quote snapshot of every tracked
//! instrument.
//!
//! ## Overview
//!
//! The warehouse owns one database file and exposes the small set of
//! operations the ingestion pipeline and the read API need:
//!
//! - **Upsert** an asset row keyed by `ticker_symbol` (insert or overwrite)
//! - **Read** all rows or a single row by ticker
//! - **Ping** the database for health checks
//! - **Audit** per-instrument sync outcomes in `sync_log`
//!
//! All values are passed as bound parameters, never interpolated into SQL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quotesync_warehouse::{AssetRow, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     warehouse.upsert_asset(&AssetRow {
//!         ticker_symbol: "AAPL".to_string(),
//!         name: "Apple Inc.".to_string(),
//!         asset_type: "stock".to_string(),
//!         current_price: 189.5,
//!         percent_change_today: 1.2,
//!         price_updated_at: "2026-02-20T15:30:00.000000Z".to_string(),
//!         currency: "USD".to_string(),
//!     })?;
//!
//!     let stored = warehouse.get_asset("AAPL")?;
//!     println!("{stored:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `assets` | Latest snapshot per ticker |
//! | `sync_log` | Per-run, per-instrument sync outcomes |
//! | `schema_migrations` | Applied migration versions |

pub mod migrations;
pub mod pool;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use pool::{ConnectionPool, PooledConnection};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (creating the data directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A row could not be written because one of its fields is unusable.
    #[error("invalid asset row for '{ticker}': {reason}")]
    InvalidRow { ticker: String, reason: String },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for quotesync data.
    pub quotesync_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let quotesync_home = resolve_quotesync_home();
        let db_path = quotesync_home.join("quotesync.duckdb");
        Self {
            quotesync_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// One row of the `assets` table.
///
/// `price_updated_at` is an RFC3339 UTC timestamp with microsecond precision
/// (`YYYY-MM-DDTHH:MM:SS.ffffffZ`), which is also the shape returned on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRow {
    pub ticker_symbol: String,
    pub name: String,
    pub asset_type: String,
    pub current_price: f64,
    pub percent_change_today: f64,
    pub price_updated_at: String,
    pub currency: String,
}

/// Per-instrument outcome written to `sync_log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLogRecord {
    pub ticker_symbol: String,
    /// `saved` or `skipped`.
    pub status: String,
    pub detail: Option<String>,
}

const SELECT_ASSET_COLUMNS: &str = "SELECT ticker_symbol, name, asset_type, current_price, \
     percent_change_today, strftime(price_updated_at, '%Y-%m-%dT%H:%M:%S.%fZ'), currency \
     FROM assets";

/// The storage handle shared by the ingestion run and the read API.
#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open (creating if needed) the database file and apply migrations.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Round-trip a trivial query to prove the database is reachable.
    pub fn ping(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        let _: i32 = connection.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(())
    }

    /// Insert the row, or overwrite every non-key column of the existing row
    /// with the same `ticker_symbol`.
    pub fn upsert_asset(&self, row: &AssetRow) -> Result<(), WarehouseError> {
        let price_updated_at = storage_timestamp(row)?;
        let connection = self.pool.acquire()?;

        let params: [&dyn ToSql; 7] = [
            &row.ticker_symbol,
            &row.name,
            &row.asset_type,
            &row.current_price,
            &row.percent_change_today,
            &price_updated_at,
            &row.currency,
        ];
        connection.execute(
            "INSERT INTO assets \
             (ticker_symbol, name, asset_type, current_price, percent_change_today, price_updated_at, currency) \
             VALUES (?, ?, ?, ?, ?, CAST(? AS TIMESTAMP), ?) \
             ON CONFLICT (ticker_symbol) DO UPDATE SET \
             name = excluded.name, \
             asset_type = excluded.asset_type, \
             current_price = excluded.current_price, \
             percent_change_today = excluded.percent_change_today, \
             price_updated_at = excluded.price_updated_at, \
             currency = excluded.currency",
            params.as_slice(),
        )?;

        Ok(())
    }

    /// Every stored row, ordered by ticker.
    pub fn list_assets(&self) -> Result<Vec<AssetRow>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let sql = format!("{SELECT_ASSET_COLUMNS} ORDER BY ticker_symbol");
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], read_asset_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The stored row for `ticker_symbol`, if any. Matching is exact.
    pub fn get_asset(&self, ticker_symbol: &str) -> Result<Option<AssetRow>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let sql = format!("{SELECT_ASSET_COLUMNS} WHERE ticker_symbol = ?");
        let mut statement = connection.prepare(sql.as_str())?;
        let params: [&dyn ToSql; 1] = [&ticker_symbol];
        let mut rows = statement.query_map(params.as_slice(), read_asset_row)?;
        let first = rows.next().transpose()?;
        Ok(first)
    }

    /// Append one audit row per instrument outcome of a sync run.
    pub fn record_sync_log(
        &self,
        run_id: &str,
        records: &[SyncLogRecord],
    ) -> Result<(), WarehouseError> {
        if records.is_empty() {
            return Ok(());
        }

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            for record in records {
                let params: [&dyn ToSql; 4] = [
                    &run_id,
                    &record.ticker_symbol,
                    &record.status,
                    &record.detail,
                ];
                connection.execute(
                    "INSERT INTO sync_log (run_id, ticker_symbol, status, detail, logged_at) \
                     VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Number of `sync_log` rows written for `run_id`.
    pub fn sync_log_len(&self, run_id: &str) -> Result<usize, WarehouseError> {
        let connection = self.pool.acquire()?;
        let params: [&dyn ToSql; 1] = [&run_id];
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM sync_log WHERE run_id = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn read_asset_row(row: &::duckdb::Row<'_>) -> Result<AssetRow, ::duckdb::Error> {
    Ok(AssetRow {
        ticker_symbol: row.get(0)?,
        name: row.get(1)?,
        asset_type: row.get(2)?,
        current_price: row.get(3)?,
        percent_change_today: row.get(4)?,
        price_updated_at: row.get(5)?,
        currency: row.get(6)?,
    })
}

/// Commit on success, roll back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Convert `YYYY-MM-DDTHH:MM:SS[.f]Z` into the naive form `DuckDB` casts to `TIMESTAMP`.
fn storage_timestamp(row: &AssetRow) -> Result<String, WarehouseError> {
    let value = row.price_updated_at.trim();
    let Some(naive) = value.strip_suffix('Z') else {
        return Err(WarehouseError::InvalidRow {
            ticker: row.ticker_symbol.clone(),
            reason: format!("price_updated_at must be UTC with a 'Z' suffix: '{value}'"),
        });
    };
    if naive.len() < 19 || naive.as_bytes().get(10) != Some(&b'T') {
        return Err(WarehouseError::InvalidRow {
            ticker: row.ticker_symbol.clone(),
            reason: format!("price_updated_at is not an RFC3339 timestamp: '{value}'"),
        });
    }

    Ok(naive.replacen('T', " ", 1))
}

/// Resolve the quotesync home directory from `QUOTESYNC_HOME`, falling back to `~/.quotesync`.
pub fn resolve_quotesync_home() -> PathBuf {
    if let Some(path) = env::var_os("QUOTESYNC_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".quotesync");
    }

    PathBuf::from(".quotesync")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp_warehouse(temp: &tempfile::TempDir) -> Warehouse {
        let quotesync_home = temp.path().join("quotesync-home");
        let db_path = quotesync_home.join("quotesync.duckdb");
        Warehouse::open(WarehouseConfig {
            quotesync_home,
            db_path,
            max_pool_size: 2,
        })
        .expect("warehouse open")
    }

    fn sample_row(ticker: &str, price: f64) -> AssetRow {
        AssetRow {
            ticker_symbol: ticker.to_string(),
            name: format!("{ticker} Holdings"),
            asset_type: "stock".to_string(),
            current_price: price,
            percent_change_today: -0.75,
            price_updated_at: "2026-02-20T15:30:00.123456Z".to_string(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn opens_and_answers_ping() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);

        warehouse.ping().expect("ping");
        assert!(warehouse.db_path().ends_with("quotesync.duckdb"));
    }

    #[test]
    fn upsert_then_get_returns_identical_row() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);
        let row = sample_row("AAPL", 189.25);

        warehouse.upsert_asset(&row).expect("upsert");

        let stored = warehouse.get_asset("AAPL").expect("get").expect("row present");
        assert_eq!(stored, row);
    }

    #[test]
    fn get_asset_returns_none_for_unknown_ticker() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);

        assert_eq!(warehouse.get_asset("NOPE").expect("get"), None);
    }

    #[test]
    fn malicious_ticker_is_stored_verbatim() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);
        let row = sample_row(r#"AAPL'; DROP TABLE assets; --"#, 1.0);

        warehouse.upsert_asset(&row).expect("parameterized upsert");

        assert_eq!(warehouse.list_assets().expect("list").len(), 1);
        assert!(warehouse.get_asset(&row.ticker_symbol).expect("get").is_some());
    }

    #[test]
    fn rejects_timestamp_without_utc_suffix() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);
        let mut row = sample_row("MSFT", 410.0);
        row.price_updated_at = "2026-02-20T15:30:00+01:00".to_string();

        let error = warehouse.upsert_asset(&row).expect_err("must reject");
        assert!(matches!(error, WarehouseError::InvalidRow { .. }));
    }

    #[test]
    fn sync_log_rows_are_grouped_by_run() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_temp_warehouse(&temp);
        let records = vec![
            SyncLogRecord {
                ticker_symbol: "AAPL".to_string(),
                status: "saved".to_string(),
                detail: None,
            },
            SyncLogRecord {
                ticker_symbol: "NOPE".to_string(),
                status: "skipped".to_string(),
                detail: Some("provider has no quote for 'NOPE'".to_string()),
            },
        ];

        warehouse.record_sync_log("run-a", &records).expect("log run-a");
        warehouse.record_sync_log("run-b", &records[..1]).expect("log run-b");

        assert_eq!(warehouse.sync_log_len("run-a").expect("count"), 2);
        assert_eq!(warehouse.sync_log_len("run-b").expect("count"), 1);
    }
}
