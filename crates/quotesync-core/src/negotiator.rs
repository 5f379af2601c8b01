//! Consent-cookie and crumb handshake against the provider.

use std::sync::Arc;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::crumb::CrumbStrategies;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::provider::{browser_headers, ProviderEndpoints, USER_AGENT};
use crate::session::{CookieJar, Session};
use crate::IngestError;

/// Cookie name prefixes that mark the provider's consent state.
pub const CONSENT_COOKIE_PREFIXES: [&str; 2] = ["GUCE", "CONSENT"];

const CONSENT_FORM_SELECTOR: &str = "form#privacy-form";
const CRUMB_REFERER: &str = "https://www.google.com/";

/// Builds a fresh [`Session`] from scratch.
///
/// The handshake has three round trips: the landing page (consent cookies),
/// a content page (consent confirmation plus any extra cookies) and the
/// landing page again with the cookie attached (crumb extraction). Nothing is
/// retried here; the orchestrator owns retry policy.
pub struct SessionNegotiator {
    http: Arc<dyn HttpClient>,
    endpoints: ProviderEndpoints,
    strategies: CrumbStrategies,
    timeout_ms: u64,
}

impl SessionNegotiator {
    pub fn new(http: Arc<dyn HttpClient>, endpoints: ProviderEndpoints) -> Self {
        Self {
            http,
            endpoints,
            strategies: CrumbStrategies::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_strategies(mut self, strategies: CrumbStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Run the full handshake.
    ///
    /// Fails with [`IngestError::Negotiation`] when a step cannot be completed
    /// or when no strategy finds a crumb; partial cookies are dropped with it.
    pub async fn negotiate(&self) -> Result<Session, IngestError> {
        let mut cookies = self.collect_consent_cookies().await?;
        self.confirm_consent(&mut cookies).await?;
        let crumb = self.extract_crumb(&cookies).await?;

        info!(cookies = cookies.len(), "provider session negotiated");
        Ok(Session::established(cookies, crumb))
    }

    async fn collect_consent_cookies(&self) -> Result<CookieJar, IngestError> {
        let request = HttpRequest::get(&self.endpoints.landing_url)
            .with_headers(browser_headers())
            .with_timeout_ms(self.timeout_ms);
        let response = self.send("landing page", request).await?;

        let returned = response.set_cookie_pairs();
        let mut cookies = CookieJar::new();
        if returned.is_empty() {
            warn!("landing page returned no cookies; continuing without consent cookies");
            return Ok(cookies);
        }

        let consent: Vec<(String, String)> = returned
            .iter()
            .filter(|(name, _)| is_consent_cookie(name))
            .cloned()
            .collect();

        if consent.is_empty() {
            warn!(
                returned = returned.len(),
                "no consent cookies found; keeping every landing page cookie"
            );
            cookies.extend(returned);
        } else {
            debug!(consent = consent.len(), "consent cookies collected");
            cookies.extend(consent);
        }

        Ok(cookies)
    }

    async fn confirm_consent(&self, cookies: &mut CookieJar) -> Result<(), IngestError> {
        let request = HttpRequest::get(&self.endpoints.content_url)
            .with_header("user-agent", USER_AGENT)
            .with_header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .with_header("referer", &self.endpoints.landing_url)
            .with_cookie(&cookies.header_value())
            .with_timeout_ms(self.timeout_ms);
        let response = self.send("content page", request).await?;

        if has_consent_form(&response.body) {
            // Explicit consent submission is not implemented; proceed with what we have.
            warn!("provider still asks for explicit consent; continuing without submitting it");
            return Ok(());
        }

        cookies.extend(response.set_cookie_pairs());
        Ok(())
    }

    async fn extract_crumb(&self, cookies: &CookieJar) -> Result<String, IngestError> {
        let request = HttpRequest::get(&self.endpoints.landing_url)
            .with_header("user-agent", USER_AGENT)
            .with_header("referer", CRUMB_REFERER)
            .with_cookie(&cookies.header_value())
            .with_timeout_ms(self.timeout_ms);
        let response = self.send("crumb page", request).await?;

        let found = self.strategies.extract(&response.body).ok_or_else(|| {
            IngestError::negotiation(format!(
                "no crumb found after trying {}",
                self.strategies.names().join(", ")
            ))
        })?;

        if found.strategy == "token-heuristic" {
            warn!(strategy = found.strategy, "crumb matched by heuristic; it may be wrong");
        } else {
            debug!(strategy = found.strategy, "crumb extracted");
        }

        Ok(found.value)
    }

    async fn send(&self, step: &str, request: HttpRequest) -> Result<HttpResponse, IngestError> {
        let response = self.http.execute(request).await.map_err(|e| {
            IngestError::negotiation(format!("{step} request failed: {}", e.message()))
        })?;

        if !response.is_success() {
            return Err(IngestError::negotiation(format!(
                "{step} returned status {}",
                response.status
            )));
        }

        Ok(response)
    }
}

fn is_consent_cookie(name: &str) -> bool {
    CONSENT_COOKIE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

fn has_consent_form(document: &str) -> bool {
    let Ok(selector) = Selector::parse(CONSENT_FORM_SELECTOR) else {
        return false;
    };
    Html::parse_document(document).select(&selector).next().is_some()
}
