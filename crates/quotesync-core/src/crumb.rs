//! Ordered strategies for pulling the crumb token out of a landing page.
//!
//! The provider does not document where the crumb lives, so extraction is a
//! policy list: each [`CrumbExtractor`] is tried in order and the first
//! non-empty result wins. Strategies can be added, removed or tested on their
//! own without touching the negotiator.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

/// One way of finding the crumb in a raw HTML document.
pub trait CrumbExtractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, document: &str) -> Option<String>;
}

/// A crumb together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCrumb {
    pub value: String,
    pub strategy: &'static str,
}

/// `"crumb":"<value>"` anywhere in the body.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFragmentCrumb;

impl CrumbExtractor for JsonFragmentCrumb {
    fn name(&self) -> &'static str {
        "json-fragment"
    }

    fn extract(&self, document: &str) -> Option<String> {
        match_json_crumb(document)
    }
}

/// `"crumb":"<value>"` inside a `<script>` that mentions the crumb store.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrumbStoreScript;

const CRUMB_STORE_MARKER: &str = "CrumbStore";

impl CrumbExtractor for CrumbStoreScript {
    fn name(&self) -> &'static str {
        "crumb-store-script"
    }

    fn extract(&self, document: &str) -> Option<String> {
        let html = Html::parse_document(document);
        let scripts = Selector::parse("script").ok()?;

        html.select(&scripts)
            .map(|script| script.text().collect::<String>())
            .filter(|text| text.contains(CRUMB_STORE_MARKER))
            .find_map(|text| match_json_crumb(&text))
    }
}

/// `<meta name="crumb" content="<value>">`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaTagCrumb;

impl CrumbExtractor for MetaTagCrumb {
    fn name(&self) -> &'static str {
        "meta-tag"
    }

    fn extract(&self, document: &str) -> Option<String> {
        let html = Html::parse_document(document);
        let meta = Selector::parse(r#"meta[name="crumb"]"#).ok()?;

        html.select(&meta)
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_owned)
    }
}

/// Last resort: the first base64-looking run of 11+ characters.
///
/// Frequently picks up something that is not a crumb; the negotiator logs a
/// warning whenever this strategy is the one that matched.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenHeuristic;

impl CrumbExtractor for TokenHeuristic {
    fn name(&self) -> &'static str {
        "token-heuristic"
    }

    fn extract(&self, document: &str) -> Option<String> {
        static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
        let token = TOKEN
            .get_or_init(|| Regex::new(r"[A-Za-z0-9/=]{11,}").ok())
            .as_ref()?;

        token.find(document).map(|found| found.as_str().to_owned())
    }
}

/// The ordered extractor list consulted by the negotiator.
pub struct CrumbStrategies {
    extractors: Vec<Box<dyn CrumbExtractor>>,
}

impl Default for CrumbStrategies {
    fn default() -> Self {
        Self::new(vec![
            Box::new(JsonFragmentCrumb),
            Box::new(CrumbStoreScript),
            Box::new(MetaTagCrumb),
            Box::new(TokenHeuristic),
        ])
    }
}

impl CrumbStrategies {
    pub fn new(extractors: Vec<Box<dyn CrumbExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|extractor| extractor.name()).collect()
    }

    pub fn extract(&self, document: &str) -> Option<ExtractedCrumb> {
        self.extractors.iter().find_map(|extractor| {
            extractor
                .extract(document)
                .filter(|value| !value.is_empty())
                .map(|value| ExtractedCrumb {
                    value,
                    strategy: extractor.name(),
                })
        })
    }
}

fn match_json_crumb(text: &str) -> Option<String> {
    static JSON_CRUMB: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = JSON_CRUMB
        .get_or_init(|| Regex::new(r#""crumb":"([^"]+)""#).ok())
        .as_ref()?;

    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().replace("\\u002F", "/"))
        .filter(|value| !value.is_empty())
}
