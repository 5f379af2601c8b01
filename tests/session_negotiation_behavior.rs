//! Behavior-driven tests for session negotiation
//!
//! These tests verify HOW the consent-cookie and crumb handshake behaves
//! against a scripted provider: which cookies are kept, which headers are
//! sent, which crumb strategy wins and when negotiation gives up.

mod support;

use quotesync_core::{CrumbStrategies, IngestError, MetaTagCrumb, SessionNegotiator, USER_AGENT};
use support::{FakeProvider, BASE_URL};

fn negotiator(provider: &std::sync::Arc<FakeProvider>) -> SessionNegotiator {
    SessionNegotiator::new(provider.clone(), FakeProvider::endpoints()).with_timeout_ms(2_000)
}

// =============================================================================
// Negotiation: Cookies
// =============================================================================

#[tokio::test]
async fn when_consent_cookies_are_set_only_they_and_later_cookies_are_kept() {
    // Given: A landing page setting a consent cookie and a tracking cookie
    let provider = FakeProvider::new();

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: The consent cookie and the content page cookie form the jar
    assert!(session.is_ready());
    assert_eq!(
        session.cookie_header(),
        "GUCE=consent-token; A1=session-cookie"
    );
    assert_eq!(session.cookies().get("A3"), None);
    assert_eq!(session.crumb(), Some("crumb-1"));
}

#[tokio::test]
async fn when_no_consent_cookie_is_set_every_landing_cookie_is_kept() {
    // Given: A landing page without consent cookies
    let provider = FakeProvider::new();
    provider.set_landing_cookies(&["B=abc; Path=/", "A3=tracking"]);

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: Every landing cookie is retained, in order
    assert_eq!(
        session.cookie_header(),
        "B=abc; A3=tracking; A1=session-cookie"
    );
}

#[tokio::test]
async fn when_landing_page_sets_no_cookies_negotiation_continues() {
    // Given: A landing page without any set-cookie header
    let provider = FakeProvider::new();
    provider.set_landing_cookies(&[]);

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: The content page cookie and the crumb still make a usable session
    assert_eq!(session.cookie_header(), "A1=session-cookie");
    assert!(session.is_ready());

    // And: The content page request went out without a cookie header
    let content = provider
        .seen()
        .into_iter()
        .find(|seen| seen.request.url.ends_with("/quote/AAPL"))
        .expect("content page request");
    assert_eq!(content.request.header("cookie"), None);
}

#[tokio::test]
async fn when_content_page_shows_consent_form_its_cookies_are_not_merged() {
    // Given: A content page that still renders the privacy form
    let provider = FakeProvider::new();
    provider.set_content_body(
        r#"<html><body><form id="privacy-form" action="/consent"><button>Accept</button></form></body></html>"#,
    );

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: Negotiation proceeds with the consent cookie only
    assert_eq!(session.cookie_header(), "GUCE=consent-token");
    assert!(session.is_ready());
}

// =============================================================================
// Negotiation: Request Shape
// =============================================================================

#[tokio::test]
async fn when_negotiating_each_step_sends_the_expected_headers() {
    // Given: The default scripted provider
    let provider = FakeProvider::new();

    // When: A session is negotiated
    negotiator(&provider).negotiate().await.expect("session");

    // Then: Three requests were made in order
    let seen = provider.seen();
    assert_eq!(seen.len(), 3);
    let (landing, content, crumb) = (&seen[0].request, &seen[1].request, &seen[2].request);

    // And: The landing page looks like a browser navigation without a referer
    assert_eq!(landing.url, format!("{BASE_URL}/"));
    assert_eq!(landing.header("user-agent"), Some(USER_AGENT));
    assert_eq!(landing.header("sec-fetch-mode"), Some("navigate"));
    assert_eq!(landing.header("referer"), None);
    assert_eq!(landing.header("cookie"), None);
    assert_eq!(landing.timeout_ms, 2_000);

    // And: The content page carries the consent cookie and the landing referer
    assert_eq!(content.url, format!("{BASE_URL}/quote/AAPL"));
    assert_eq!(content.header("cookie"), Some("GUCE=consent-token"));
    assert_eq!(content.header("referer"), Some(format!("{BASE_URL}/").as_str()));

    // And: The crumb page carries the merged cookie
    assert_eq!(crumb.url, format!("{BASE_URL}/"));
    assert_eq!(
        crumb.header("cookie"),
        Some("GUCE=consent-token; A1=session-cookie")
    );
    assert_eq!(crumb.header("referer"), Some("https://www.google.com/"));
}

// =============================================================================
// Negotiation: Crumb Extraction
// =============================================================================

#[tokio::test]
async fn when_page_has_json_and_meta_crumbs_json_fragment_wins() {
    // Given: A crumb page with both a JSON fragment and a distinct meta tag
    let provider = FakeProvider::new();
    provider.set_crumb_body(
        r#"<html><head><meta name="crumb" content="metaCrumbValue"><script>var ctx = {"crumb":"json\u002FCrumb"};</script></head></html>"#,
    );

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: The JSON fragment value is selected, with its slash unescaped
    assert_eq!(session.crumb(), Some("json/Crumb"));
}

#[tokio::test]
async fn when_only_meta_tag_is_present_meta_crumb_is_used() {
    // Given: A crumb page exposing the crumb only through a meta tag
    let provider = FakeProvider::new();
    provider.set_crumb_body(r#"<html><head><meta name="crumb" content="metaCrumbValue"></head></html>"#);

    // When: A session is negotiated
    let session = negotiator(&provider).negotiate().await.expect("session");

    // Then: The meta tag value is the crumb
    assert_eq!(session.crumb(), Some("metaCrumbValue"));
}

#[tokio::test]
async fn when_strategies_are_narrowed_only_listed_strategies_run() {
    // Given: A negotiator restricted to the meta tag strategy
    let provider = FakeProvider::new();
    let narrowed = negotiator(&provider)
        .with_strategies(CrumbStrategies::new(vec![Box::new(MetaTagCrumb)]));

    // When: The page only has a JSON crumb fragment
    let result = narrowed.negotiate().await;

    // Then: Negotiation fails and names the strategies it tried
    let error = result.expect_err("no meta tag present");
    assert!(matches!(error, IngestError::Negotiation(ref message) if message.contains("meta-tag")));
}

#[tokio::test]
async fn when_no_strategy_finds_a_crumb_negotiation_fails() {
    // Given: A crumb page without any crumb-like content
    let provider = FakeProvider::new();
    provider.set_crumb_body("<html><body>sorry</body></html>");

    // When: A session is negotiated
    let result = negotiator(&provider).negotiate().await;

    // Then: A negotiation error is returned
    let error = result.expect_err("no crumb available");
    assert!(error.is_negotiation());
}

#[tokio::test]
async fn when_landing_page_is_unavailable_negotiation_fails_fast() {
    // Given: A landing page answering 503
    let provider = FakeProvider::new();
    provider.set_landing_status(503);

    // When: A session is negotiated
    let result = negotiator(&provider).negotiate().await;

    // Then: The error carries the status and no further page was requested
    let error = result.expect_err("landing page failed");
    assert!(matches!(error, IngestError::Negotiation(ref message) if message.contains("503")));
    assert_eq!(provider.seen().len(), 1);
}
