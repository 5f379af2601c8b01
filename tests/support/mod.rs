//! Scripted provider and storage doubles shared by the ingestion behaviour tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use quotesync_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, PersistenceGateway, ProviderEndpoints,
    QuoteRecord, Warehouse, WarehouseConfig, WarehouseGateway,
};
use tokio::time::Instant;

pub const BASE_URL: &str = "http://provider.test";
const CRUMB_REFERER: &str = "https://www.google.com/";

/// How the quote endpoint answers for one ticker.
#[derive(Debug, Clone)]
pub enum QuoteScript {
    /// A single result entry (raw JSON object).
    Entry(String),
    /// `result: []`.
    Empty,
    /// Fixed status regardless of the crumb.
    Status(u16),
}

/// What the provider saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request: HttpRequest,
    pub at: Instant,
}

/// In-memory imitation of the provider's landing page, content page and quote endpoint.
///
/// Every crumb page view mints a new crumb (`crumb-1`, `crumb-2`, ...); quote
/// requests carrying any other crumb get a 401.
pub struct FakeProvider {
    state: Mutex<ProviderState>,
}

struct ProviderState {
    landing_cookies: Vec<String>,
    content_cookies: Vec<String>,
    content_body: String,
    crumb_body: Option<String>,
    landing_status: u16,
    fail_crumb_pages_after: Option<usize>,
    crumbs_minted: usize,
    quotes: HashMap<String, QuoteScript>,
    seen: Vec<SeenRequest>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(ProviderState {
                landing_cookies: vec![
                    String::from("GUCE=consent-token; Path=/; Domain=.provider.test"),
                    String::from("A3=tracking; Path=/"),
                ],
                content_cookies: vec![String::from("A1=session-cookie; Path=/; Secure")],
                content_body: String::from("<html><body><h1>Apple Inc.</h1></body></html>"),
                crumb_body: None,
                landing_status: 200,
                fail_crumb_pages_after: None,
                crumbs_minted: 0,
                quotes: HashMap::new(),
                seen: Vec::new(),
            }),
        }
    }
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn endpoints() -> ProviderEndpoints {
        ProviderEndpoints::with_base(BASE_URL)
    }

    fn with_state(&self, apply: impl FnOnce(&mut ProviderState)) {
        let mut state = self.state.lock().expect("provider state");
        apply(&mut state);
    }

    pub fn quote(&self, ticker: &str, script: QuoteScript) {
        self.with_state(|state| {
            state.quotes.insert(ticker.to_owned(), script);
        });
    }

    pub fn priced(&self, ticker: &str, name: &str, price: f64, change: f64) {
        self.quote(
            ticker,
            QuoteScript::Entry(format!(
                r#"{{"symbol":"{ticker}","shortName":"{name}","regularMarketPrice":{price},"regularMarketChangePercent":{change},"currency":"USD"}}"#
            )),
        );
    }

    pub fn set_landing_cookies(&self, cookies: &[&str]) {
        self.with_state(|state| {
            state.landing_cookies = cookies.iter().map(|c| (*c).to_owned()).collect();
        });
    }

    pub fn set_content_body(&self, body: &str) {
        self.with_state(|state| state.content_body = body.to_owned());
    }

    /// Serve `body` as the crumb page instead of minting crumbs.
    pub fn set_crumb_body(&self, body: &str) {
        self.with_state(|state| state.crumb_body = Some(body.to_owned()));
    }

    pub fn set_landing_status(&self, status: u16) {
        self.with_state(|state| state.landing_status = status);
    }

    /// After `count` crumb pages, serve pages without any crumb.
    pub fn fail_crumb_pages_after(&self, count: usize) {
        self.with_state(|state| state.fail_crumb_pages_after = Some(count));
    }

    pub fn crumbs_minted(&self) -> usize {
        self.state.lock().expect("provider state").crumbs_minted
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.lock().expect("provider state").seen.clone()
    }

    /// Start times of every handshake, i.e. landing page views that are not
    /// crumb page views.
    pub fn handshake_starts(&self) -> Vec<Instant> {
        let landing = format!("{BASE_URL}/");
        self.seen()
            .into_iter()
            .filter(|seen| {
                seen.request.url == landing && seen.request.header("referer") != Some(CRUMB_REFERER)
            })
            .map(|seen| seen.at)
            .collect()
    }

    /// Quote requests in arrival order, as (ticker, crumb, at).
    pub fn quote_attempts(&self) -> Vec<(String, String, Instant)> {
        self.seen()
            .into_iter()
            .filter_map(|seen| {
                let (ticker, crumb) = quote_params(&seen.request.url)?;
                Some((ticker, crumb, seen.at))
            })
            .collect()
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let mut state = self.state.lock().expect("provider state");
        state.seen.push(SeenRequest {
            request: request.clone(),
            at: Instant::now(),
        });

        if let Some((ticker, crumb)) = quote_params(&request.url) {
            return state.quote_response(&ticker, &crumb);
        }

        let landing = format!("{BASE_URL}/");
        let content = format!("{BASE_URL}/quote/AAPL");
        if request.url == content {
            let mut response = HttpResponse::ok(state.content_body.clone());
            for cookie in &state.content_cookies {
                response = response.with_header("set-cookie", cookie.clone());
            }
            return response;
        }

        if request.url == landing && request.header("referer") == Some(CRUMB_REFERER) {
            return state.crumb_page();
        }

        if request.url == landing {
            let mut response = HttpResponse::new(
                state.landing_status,
                "<html><head><title>Finance</title></head></html>",
            );
            for cookie in &state.landing_cookies {
                response = response.with_header("set-cookie", cookie.clone());
            }
            return response;
        }

        HttpResponse::new(404, "not found")
    }
}

impl ProviderState {
    fn crumb_page(&mut self) -> HttpResponse {
        if let Some(body) = &self.crumb_body {
            return HttpResponse::ok(body.clone());
        }
        if self
            .fail_crumb_pages_after
            .is_some_and(|limit| self.crumbs_minted >= limit)
        {
            return HttpResponse::ok("<html><body>sorry</body></html>");
        }

        self.crumbs_minted += 1;
        HttpResponse::ok(format!(
            r#"<html><head><script>window.ctx = {{"user":{{"crumb":"crumb-{}"}}}};</script></head></html>"#,
            self.crumbs_minted
        ))
    }

    fn quote_response(&self, ticker: &str, crumb: &str) -> HttpResponse {
        if let Some(QuoteScript::Status(status)) = self.quotes.get(ticker) {
            return HttpResponse::new(*status, r#"{"finance":{"error":"rejected"}}"#);
        }

        let current = format!("crumb-{}", self.crumbs_minted);
        if self.crumbs_minted == 0 || crumb != current {
            return HttpResponse::new(401, r#"{"finance":{"error":"Invalid Crumb"}}"#);
        }

        match self.quotes.get(ticker) {
            Some(QuoteScript::Entry(entry)) => HttpResponse::ok(format!(
                r#"{{"quoteResponse":{{"result":[{entry}],"error":null}}}}"#
            )),
            Some(QuoteScript::Empty) | None => {
                HttpResponse::ok(r#"{"quoteResponse":{"result":[],"error":null}}"#)
            }
            Some(QuoteScript::Status(status)) => HttpResponse::new(*status, ""),
        }
    }
}

impl HttpClient for FakeProvider {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.respond(&request)) })
    }
}

fn quote_params(url: &str) -> Option<(String, String)> {
    let query = url
        .strip_prefix(&format!("{BASE_URL}/v7/finance/quote?"))?
        .to_owned();
    let mut ticker = None;
    let mut crumb = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        let value = urlencoding::decode(value).ok()?.into_owned();
        match key {
            "symbols" => ticker = Some(value),
            "crumb" => crumb = Some(value),
            _ => {}
        }
    }
    Some((ticker?, crumb.unwrap_or_default()))
}

/// Gateway double that keeps every upserted record.
#[derive(Default)]
pub struct RecordingGateway {
    records: Mutex<Vec<QuoteRecord>>,
}

impl RecordingGateway {
    pub fn tickers(&self) -> Vec<String> {
        self.records
            .lock()
            .expect("records")
            .iter()
            .map(|record| record.ticker_symbol.to_string())
            .collect()
    }
}

impl PersistenceGateway for RecordingGateway {
    fn upsert<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            self.records.lock().expect("records").push(record.clone());
            true
        })
    }
}

/// Writes through a [`WarehouseGateway`] except for the listed tickers, whose
/// upserts fail the way a storage error would.
pub struct RejectingGateway {
    inner: WarehouseGateway,
    rejected: Vec<String>,
}

impl RejectingGateway {
    pub fn new(warehouse: Arc<Warehouse>, rejected: &[&str]) -> Self {
        Self {
            inner: WarehouseGateway::new(warehouse),
            rejected: rejected.iter().map(|ticker| (*ticker).to_owned()).collect(),
        }
    }
}

impl PersistenceGateway for RejectingGateway {
    fn upsert<'a>(
        &'a self,
        record: &'a QuoteRecord,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        if self
            .rejected
            .iter()
            .any(|ticker| ticker == record.ticker_symbol.as_str())
        {
            return Box::pin(async { false });
        }
        self.inner.upsert(record)
    }
}

pub fn open_temp_warehouse(temp: &tempfile::TempDir) -> Arc<Warehouse> {
    let quotesync_home = temp.path().join("quotesync-home");
    let db_path = quotesync_home.join("quotesync.duckdb");
    Arc::new(
        Warehouse::open(WarehouseConfig {
            quotesync_home,
            db_path,
            max_pool_size: 2,
        })
        .expect("warehouse open"),
    )
}
