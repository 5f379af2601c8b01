//! Provider profile: endpoint URLs and the browser header set every request carries.

/// The three provider endpoints the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Landing page; sets consent cookies and embeds the crumb.
    pub landing_url: String,
    /// A representative content page used to confirm consent.
    pub content_url: String,
    /// Batch quote JSON endpoint (`symbols` + `crumb` query parameters).
    pub quote_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            landing_url: String::from("https://finance.yahoo.com"),
            content_url: String::from("https://finance.yahoo.com/quote/AAPL"),
            quote_url: String::from("https://query1.finance.yahoo.com/v7/finance/quote"),
        }
    }
}

impl ProviderEndpoints {
    /// Point every endpoint at `base` (used by tests and staging mirrors).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            landing_url: format!("{base}/"),
            content_url: format!("{base}/quote/AAPL"),
            quote_url: format!("{base}/v7/finance/quote"),
        }
    }

    /// Quote URL for a comma-joined ticker list and crumb, both URL-encoded.
    pub fn quote_request_url(&self, symbols: &[&str], crumb: &str) -> String {
        format!(
            "{}?symbols={}&crumb={}",
            self.quote_url,
            urlencoding::encode(&symbols.join(",")),
            urlencoding::encode(crumb)
        )
    }
}

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

const DOCUMENT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Headers of a top-level navigation in a desktop browser.
pub fn browser_headers() -> [(&'static str, &'static str); 9] {
    [
        ("user-agent", USER_AGENT),
        ("accept", DOCUMENT_ACCEPT),
        ("accept-language", "en-US,en;q=0.9"),
        ("connection", "keep-alive"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
    ]
}
