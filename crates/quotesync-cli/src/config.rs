//! Runtime configuration from `QUOTESYNC_*` variables.
//!
//! `.env` is loaded into the process environment before this runs, so a
//! real environment variable always wins over the file. Command-line flags
//! are applied on top by the individual commands.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use quotesync_core::{DEFAULT_BATCH_PAUSE, DEFAULT_REQUEST_INTERVAL, DEFAULT_TIMEOUT_MS};
use quotesync_warehouse::{resolve_quotesync_home, WarehouseConfig};

use crate::error::CliError;

pub const DEFAULT_TICKERS: [&str; 5] = ["AAPL", "MSFT", "GOOGL", "BTC-USD", "ETH-USD"];
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DB_FILE_NAME: &str = "quotesync.duckdb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = CliError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if value.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else {
            Err(CliError::Config(format!(
                "QUOTESYNC_LOG_FORMAT must be 'text' or 'json', got '{value}'"
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub tickers: Vec<String>,
    pub request_interval: Duration,
    /// Turns per group before the extra batch pause; 0 disables it.
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub timeout_ms: u64,
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let home = value("QUOTESYNC_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(resolve_quotesync_home);
        let db_path = value("QUOTESYNC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(DB_FILE_NAME));

        let tickers = match value("QUOTESYNC_TICKERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|ticker| !ticker.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_TICKERS.iter().map(|ticker| (*ticker).to_owned()).collect(),
        };

        let request_interval = match value("QUOTESYNC_REQUEST_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_number("QUOTESYNC_REQUEST_INTERVAL_MS", &raw)?),
            None => DEFAULT_REQUEST_INTERVAL,
        };
        let batch_size = match value("QUOTESYNC_BATCH_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CliError::Config(format!("QUOTESYNC_BATCH_SIZE must be a whole number, got '{raw}'"))
            })?,
            None => 0,
        };
        let batch_pause = match value("QUOTESYNC_BATCH_PAUSE_MS") {
            Some(raw) => Duration::from_millis(parse_number("QUOTESYNC_BATCH_PAUSE_MS", &raw)?),
            None => DEFAULT_BATCH_PAUSE,
        };
        let timeout_ms = match value("QUOTESYNC_TIMEOUT_MS") {
            Some(raw) => parse_number("QUOTESYNC_TIMEOUT_MS", &raw)?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let listen_raw = value("QUOTESYNC_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr = listen_raw.trim().parse().map_err(|_| {
            CliError::Config(format!("QUOTESYNC_LISTEN_ADDR is not a socket address: '{listen_raw}'"))
        })?;

        let log_format = match value("QUOTESYNC_LOG_FORMAT") {
            Some(raw) => raw.trim().parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            home,
            db_path,
            tickers,
            request_interval,
            batch_size,
            batch_pause,
            timeout_ms,
            listen_addr,
            log_format,
        })
    }

    /// Replace the database file, e.g. from `--db-path`.
    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        self
    }

    pub fn warehouse_config(&self) -> WarehouseConfig {
        WarehouseConfig {
            quotesync_home: self.home.clone(),
            db_path: self.db_path.clone(),
            ..WarehouseConfig::default()
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::Config(format!("{key} must be a whole number of milliseconds, got '{raw}'")))
}
