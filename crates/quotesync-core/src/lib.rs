//! # Quotesync Core
//!
//! Ingestion pipeline that keeps the latest price snapshot of a fixed set of
//! instruments in the warehouse.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Domain models (Symbol, QuoteRecord, InstrumentBatch) |
//! | [`error`] | Validation and ingestion error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Provider endpoints and browser header profile |
//! | [`session`] | Cookie jar and crumb held for one run |
//! | [`crumb`] | Ordered crumb extraction strategies |
//! | [`negotiator`] | Consent cookie and crumb handshake |
//! | [`fetcher`] | Single-instrument quote requests |
//! | [`pacing`] | Minimum-interval request gate |
//! | [`gateway`] | Persistence boundary over the warehouse |
//! | [`orchestrator`] | Batch loop with re-negotiation and failure isolation |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌───────────────────┐
//! │ IngestionOrchestrator│────▶│ SessionNegotiator │
//! └──────────┬───────────┘     └─────────┬─────────┘
//!            │                           │
//!            ▼                           ▼
//! ┌──────────────────────┐     ┌───────────────────┐
//! │ QuoteFetcher         │────▶│ HttpClient        │
//! └──────────┬───────────┘     └───────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ PersistenceGateway   │──▶ quotesync-warehouse
//! └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotesync_core::{
//!     IngestionOrchestrator, InstrumentBatch, MinIntervalGate, ProviderEndpoints,
//!     QuoteFetcher, ReqwestHttpClient, SessionNegotiator, TransportConfig, WarehouseGateway,
//! };
//!
//! let http = Arc::new(ReqwestHttpClient::new(&TransportConfig::default())?);
//! let endpoints = ProviderEndpoints::default();
//! let mut orchestrator = IngestionOrchestrator::new(
//!     SessionNegotiator::new(http.clone(), endpoints.clone()),
//!     QuoteFetcher::new(http, endpoints),
//!     Arc::new(WarehouseGateway::new(warehouse)),
//!     Box::new(MinIntervalGate::default()),
//! );
//! let report = orchestrator.run(&InstrumentBatch::parse(["AAPL", "BTC-USD"])?).await?;
//! ```

pub mod crumb;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod http_client;
pub mod negotiator;
pub mod orchestrator;
pub mod pacing;
pub mod provider;
pub mod session;

// Domain models
pub use domain::{AssetType, InstrumentBatch, QuoteRecord, Symbol, UtcDateTime, DEFAULT_CURRENCY};

// Error types
pub use error::{IngestError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, TransportConfig,
    DEFAULT_TIMEOUT_MS,
};

// Provider profile and session material
pub use crumb::{
    CrumbExtractor, CrumbStoreScript, CrumbStrategies, ExtractedCrumb, JsonFragmentCrumb,
    MetaTagCrumb, TokenHeuristic,
};
pub use provider::{browser_headers, ProviderEndpoints, USER_AGENT};
pub use session::{CookieJar, Session};

// Pipeline components
pub use fetcher::QuoteFetcher;
pub use gateway::{asset_row, PersistenceGateway, WarehouseGateway};
pub use negotiator::{SessionNegotiator, CONSENT_COOKIE_PREFIXES};
pub use orchestrator::{InstrumentOutcome, InstrumentReport, IngestionOrchestrator, RunReport};
pub use pacing::{
    MinIntervalGate, PacingGate, Unpaced, DEFAULT_BATCH_PAUSE, DEFAULT_REQUEST_INTERVAL,
};

// Warehouse (re-exported from quotesync-warehouse)
pub use quotesync_warehouse::{AssetRow, SyncLogRecord, Warehouse, WarehouseConfig, WarehouseError};
