//! # Quotesync API
//!
//! Thin read API over the warehouse `assets` table.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /health` | `200 {"message"}` when storage answers, `500 {"error"}` otherwise |
//! | `GET /instruments` | `200 [AssetRow, ...]` ordered by ticker |
//! | `GET /instruments/:ticker` | `200 AssetRow`, `404`/`400`/`500 {"error"}` |

pub mod error;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use quotesync_core::Symbol;
use quotesync_warehouse::{AssetRow, Warehouse, WarehouseError};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ApiResult};

/// Read side of the storage the router serves from.
pub trait AssetReader: Send + Sync + 'static {
    fn ping(&self) -> Result<(), WarehouseError>;
    fn list_assets(&self) -> Result<Vec<AssetRow>, WarehouseError>;
    fn get_asset(&self, ticker_symbol: &str) -> Result<Option<AssetRow>, WarehouseError>;
}

impl AssetReader for Warehouse {
    fn ping(&self) -> Result<(), WarehouseError> {
        Warehouse::ping(self)
    }

    fn list_assets(&self) -> Result<Vec<AssetRow>, WarehouseError> {
        Warehouse::list_assets(self)
    }

    fn get_asset(&self, ticker_symbol: &str) -> Result<Option<AssetRow>, WarehouseError> {
        Warehouse::get_asset(self, ticker_symbol)
    }
}

type SharedReader = Arc<dyn AssetReader>;

/// Build the router; every storage call runs on the blocking pool.
pub fn app_router(reader: SharedReader) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/instruments", get(list_instruments))
        .route("/instruments/:ticker", get(get_instrument))
        .layer(CorsLayer::permissive())
        .with_state(reader)
}

async fn health(State(reader): State<SharedReader>) -> ApiResult<Json<Value>> {
    with_reader(reader, |reader| reader.ping()).await?;
    Ok(Json(json!({ "message": "storage reachable" })))
}

async fn list_instruments(State(reader): State<SharedReader>) -> ApiResult<Json<Vec<AssetRow>>> {
    let rows = with_reader(reader, |reader| reader.list_assets()).await?;
    Ok(Json(rows))
}

async fn get_instrument(
    State(reader): State<SharedReader>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<AssetRow>> {
    let symbol = Symbol::parse(&ticker).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let key = symbol.to_string();
    let row = with_reader(reader, move |reader| reader.get_asset(&key)).await?;
    row.map(Json)
        .ok_or_else(|| ApiError::NotFound(symbol.to_string()))
}

async fn with_reader<T, F>(reader: SharedReader, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn AssetReader) -> Result<T, WarehouseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(reader.as_ref()))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}
