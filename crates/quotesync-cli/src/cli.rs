//! CLI argument definitions for quotesync.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sync` | Run one paced ingestion batch into the warehouse |
//! | `serve` | Serve the read API |
//! | `show` | Print stored instruments as JSON |
//!
//! Flags override the `QUOTESYNC_*` environment (and `.env`) settings.
//!
//! # Examples
//!
//! ```bash
//! # Sync the configured tickers
//! quotesync sync
//!
//! # Sync two tickers one second apart and keep the failures
//! quotesync sync AAPL BTC-USD --interval-ms 1000 --failed-out failed.txt
//!
//! # A long watchlist, resting 10s after every 50 requests
//! quotesync sync --tickers-file sp500.txt --batch-size 50 --batch-pause-ms 10000
//!
//! # Serve the read API
//! quotesync serve --listen 0.0.0.0:3000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "quotesync",
    author,
    version,
    about = "Keep the latest market quotes for a fixed ticker list in DuckDB"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// DuckDB file to use instead of `QUOTESYNC_DB_PATH`.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every configured instrument once and upsert it.
    Sync(SyncArgs),
    /// Serve `/health`, `/instruments` and `/instruments/:ticker`.
    Serve(ServeArgs),
    /// Print stored rows.
    Show(ShowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Tickers to sync; defaults to `QUOTESYNC_TICKERS`.
    pub tickers: Vec<String>,

    /// File with one ticker per line (`#` comments allowed).
    #[arg(long)]
    pub tickers_file: Option<PathBuf>,

    /// Minimum spacing between provider requests.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Take an extra pause after this many requests; 0 disables it.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Length of the extra pause between groups.
    #[arg(long)]
    pub batch_pause_ms: Option<u64>,

    /// Per-request timeout.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Write skipped tickers to this file, one per line.
    #[arg(long)]
    pub failed_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind; defaults to `QUOTESYNC_LISTEN_ADDR`.
    #[arg(long)]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Print only this ticker.
    pub ticker: Option<String>,
}
