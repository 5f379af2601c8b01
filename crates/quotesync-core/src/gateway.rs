use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use quotesync_warehouse::{AssetRow, Warehouse, WarehouseError};
use tracing::error;

use crate::QuoteRecord;

/// Output boundary of the ingestion pipeline.
///
/// `upsert` is idempotent by ticker. Storage failures never reach the caller:
/// they are logged here and reported as `false`.
pub trait PersistenceGateway: Send + Sync {
    fn upsert<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Writes quotes into the DuckDB `assets` table.
#[derive(Clone)]
pub struct WarehouseGateway {
    warehouse: Arc<Warehouse>,
}

impl WarehouseGateway {
    pub fn new(warehouse: Arc<Warehouse>) -> Self {
        Self { warehouse }
    }
}

impl PersistenceGateway for WarehouseGateway {
    fn upsert<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let row = asset_row(record);
            let warehouse = Arc::clone(&self.warehouse);
            let outcome = tokio::task::spawn_blocking(move || warehouse.upsert_asset(&row))
                .await
                .map_err(|e| WarehouseError::Io(std::io::Error::other(e.to_string())))
                .and_then(|result| result);

            match outcome {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        ticker = %record.ticker_symbol,
                        error = %e,
                        "failed to persist quote"
                    );
                    false
                }
            }
        })
    }
}

/// Storage shape of a quote.
pub fn asset_row(record: &QuoteRecord) -> AssetRow {
    AssetRow {
        ticker_symbol: record.ticker_symbol.to_string(),
        name: record.name.clone(),
        asset_type: record.asset_type.as_str().to_owned(),
        current_price: record.current_price,
        percent_change_today: record.percent_change_today,
        price_updated_at: record.price_updated_at.format_storage(),
        currency: record.currency.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Symbol, UtcDateTime};

    #[test]
    fn asset_row_carries_every_field() {
        let at = UtcDateTime::parse("2025-03-04T15:16:17.123456Z").expect("timestamp");
        let record = QuoteRecord::new(
            Symbol::parse("ETH-USD").expect("symbol"),
            "Ethereum USD",
            3120.75,
            2.5,
            at,
            "USD",
        )
        .expect("record");

        let row = asset_row(&record);

        assert_eq!(row.ticker_symbol, "ETH-USD");
        assert_eq!(row.name, "Ethereum USD");
        assert_eq!(row.asset_type, "crypto");
        assert_eq!(row.current_price, 3120.75);
        assert_eq!(row.percent_change_today, 2.5);
        assert_eq!(row.price_updated_at, "2025-03-04T15:16:17.123456Z");
        assert_eq!(row.currency, "USD");
    }
}
