use std::sync::Arc;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::provider::{ProviderEndpoints, USER_AGENT};
use crate::session::Session;
use crate::{IngestError, QuoteRecord, Symbol, UtcDateTime};

/// Single-instrument quote request against the provider's JSON endpoint.
///
/// No retries and no session handling; a rejected session surfaces as
/// [`IngestError::Provider`] with status 401 or 403.
pub struct QuoteFetcher {
    http: Arc<dyn HttpClient>,
    endpoints: ProviderEndpoints,
    timeout_ms: u64,
}

impl QuoteFetcher {
    pub fn new(http: Arc<dyn HttpClient>, endpoints: ProviderEndpoints) -> Self {
        Self {
            http,
            endpoints,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub async fn fetch_quote(
        &self,
        symbol: &Symbol,
        session: &Session,
    ) -> Result<QuoteRecord, IngestError> {
        let url = self
            .endpoints
            .quote_request_url(&[symbol.as_str()], session.crumb().unwrap_or_default());
        let request = HttpRequest::get(url)
            .with_header("user-agent", USER_AGENT)
            .with_header("accept", "application/json")
            .with_header("referer", &self.endpoints.landing_url)
            .with_cookie(&session.cookie_header())
            .with_timeout_ms(self.timeout_ms);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(IngestError::Provider {
                status: response.status,
            });
        }

        parse_quote_response(symbol, &response.body, UtcDateTime::now())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: Option<QuoteResponseBody>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseBody {
    result: Option<Vec<ProviderQuote>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderQuote {
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change_percent: Option<f64>,
    currency: Option<String>,
}

/// Map the first result entry onto a [`QuoteRecord`] stamped with `fetched_at`.
///
/// The record keeps the requested symbol as its key; absent names fall back
/// from short name to long name to the ticker, absent numbers to zero.
pub(crate) fn parse_quote_response(
    symbol: &Symbol,
    body: &str,
    fetched_at: UtcDateTime,
) -> Result<QuoteRecord, IngestError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| IngestError::malformed(format!("invalid quote JSON: {e}")))?;

    let results = envelope
        .quote_response
        .and_then(|response| response.result)
        .ok_or_else(|| IngestError::malformed("missing quoteResponse.result"))?;

    let quote = results
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::NotFound {
            ticker: symbol.to_string(),
        })?;

    let name = [quote.short_name, quote.long_name]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| symbol.to_string());

    QuoteRecord::new(
        symbol.clone(),
        name,
        quote.regular_market_price.unwrap_or(0.0),
        quote.regular_market_change_percent.unwrap_or(0.0),
        fetched_at,
        quote.currency.unwrap_or_default(),
    )
    .map_err(|e| IngestError::malformed(format!("quote for '{symbol}' rejected: {e}")))
}
