//! # Domain Models
//!
//! Canonical types that flow through an ingestion run.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated provider ticker |
//! | [`AssetType`] | `stock` or `crypto`, derived from the ticker |
//! | [`QuoteRecord`] | Latest price snapshot for one instrument |
//! | [`InstrumentBatch`] | Ordered input list for one run |
//! | [`UtcDateTime`] | UTC timestamp with microsecond precision |

mod models;
mod symbol;
mod timestamp;

pub use models::{AssetType, InstrumentBatch, QuoteRecord, DEFAULT_CURRENCY};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
