//! Wiki client behaviour against a mock MediaWiki API.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wikivox::wiki::{
    ArticleFetcher, ArticleIdentifier, ArticleResolver, FetchOptions, ResolveOptions, WikiClient, WikiEndpoint,
};
use wikivox::WikiVoxError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> Arc<WikiClient> {
    let endpoint = WikiEndpoint::new("en", "wikipedia.org").with_api_url(format!("{}/w/api.php", server.uri()));
    Arc::new(WikiClient::new(endpoint, "wikivox-tests/0.1").unwrap())
}

fn fetch_options() -> FetchOptions {
    FetchOptions {
        lead_only: false,
        timeout: Duration::from_secs(5),
        max_retries: 2,
    }
}

fn homer_page() -> serde_json::Value {
    json!({
        "batchcomplete": true,
        "query": {
            "pages": [{
                "pageid": 13552,
                "ns": 0,
                "title": "Homer",
                "extract": "Homer was a Greek poet.\n\n== Works ==\nThe Iliad and the Odyssey.[1]\n\n== See also ==\n"
            }]
        }
    })
}

#[tokio::test]
async fn test_search_maps_opensearch_in_rank_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "opensearch"))
        .and(query_param("search", "mercury"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "mercury",
            ["Mercury (planet)", "Mercury (element)"],
            ["Smallest planet", "Chemical element"],
            [
                "https://en.wikipedia.org/wiki/Mercury_(planet)",
                "https://en.wikipedia.org/wiki/Mercury_(element)"
            ]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let resolver = ArticleResolver::new(WikiEndpoint::new("en", "wikipedia.org"), client);
    let err = resolver
        .resolve("mercury", &ResolveOptions::default())
        .await
        .unwrap_err();

    let candidates = err.candidates().expect("ambiguous search should carry candidates");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].title, "Mercury (planet)");
    assert_eq!(candidates[0].snippet, "Smallest planet");
    assert!(candidates[0].score > candidates[1].score);
}

#[tokio::test]
async fn test_auto_select_takes_top_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "opensearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "homer",
            ["Homer", "Homer Simpson"],
            ["", ""],
            ["https://en.wikipedia.org/wiki/Homer", "https://en.wikipedia.org/wiki/Homer_Simpson"]
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let resolver = ArticleResolver::new(WikiEndpoint::new("en", "wikipedia.org"), client);
    let options = ResolveOptions {
        auto_select: true,
        ..Default::default()
    };
    let id = resolver.resolve("homer", &options).await.unwrap();
    assert_eq!(id, ArticleIdentifier::url("https://en.wikipedia.org/wiki/Homer"));
}

#[tokio::test]
async fn test_url_input_skips_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let resolver = ArticleResolver::new(WikiEndpoint::new("en", "wikipedia.org"), client);
    let id = resolver
        .resolve("https://en.wikipedia.org/wiki/Henry_VIII", &ResolveOptions::default())
        .await
        .unwrap();
    assert_eq!(id.value, "https://en.wikipedia.org/wiki/Henry_VIII");
}

#[tokio::test]
async fn test_fetch_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("action", "query"))
        .and(query_param("titles", "Homer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(homer_page()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ArticleFetcher::with_backoff(client_for(&server).await, Duration::ZERO);
    let article = fetcher
        .fetch(&ArticleIdentifier::url("https://en.wikipedia.org/wiki/Homer"), &fetch_options())
        .await
        .unwrap();

    assert_eq!(article.title, "Homer");
    let headings: Vec<&str> = article.sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, ["Introduction", "Works"]);
    assert_eq!(article.sections[1].level, 2);
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = ArticleFetcher::with_backoff(client_for(&server).await, Duration::ZERO);
    let err = fetcher
        .fetch(&ArticleIdentifier::title("Homer"), &fetch_options())
        .await
        .unwrap_err();

    match err {
        WikiVoxError::Network { attempts, status, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(status, Some(502));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_page_is_not_found_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": [{ "ns": 0, "title": "Nonexistent xyz", "missing": true }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ArticleFetcher::with_backoff(client_for(&server).await, Duration::ZERO);
    let err = fetcher
        .fetch(&ArticleIdentifier::title("Nonexistent xyz"), &fetch_options())
        .await
        .unwrap_err();
    assert!(matches!(err, WikiVoxError::NotFound { .. }));
}

#[tokio::test]
async fn test_http_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ArticleFetcher::with_backoff(client_for(&server).await, Duration::ZERO);
    let err = fetcher
        .fetch(&ArticleIdentifier::title("Homer"), &fetch_options())
        .await
        .unwrap_err();
    assert!(matches!(err, WikiVoxError::NotFound { query } if query == "Homer"));
}

#[tokio::test]
async fn test_disambiguation_page_lists_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {
                "pages": [{
                    "ns": 0,
                    "title": "Mercury",
                    "extract": "Mercury may refer to:",
                    "pageprops": { "disambiguation": "" },
                    "links": [
                        { "ns": 0, "title": "Mercury (planet)" },
                        { "ns": 0, "title": "Mercury (element)" },
                        { "ns": 0, "title": "Mercury (mythology)" }
                    ]
                }]
            }
        })))
        .mount(&server)
        .await;

    let fetcher = ArticleFetcher::with_backoff(client_for(&server).await, Duration::ZERO);
    let err = fetcher
        .fetch(&ArticleIdentifier::title("Mercury"), &fetch_options())
        .await
        .unwrap_err();

    match err {
        WikiVoxError::Disambiguation { title, candidates } => {
            assert_eq!(title, "Mercury");
            assert_eq!(candidates.len(), 3);
            assert_eq!(candidates[1].title, "Mercury (element)");
            assert!(candidates[1].url.starts_with("https://en.wikipedia.org/wiki/"));
        }
        other => panic!("unexpected {other:?}"),
    }
}
