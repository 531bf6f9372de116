//! MediaWiki API client.
//!
//! Wraps one pooled `reqwest::Client` and implements both [`SearchProvider`]
//! (opensearch) and [`PageSource`] (plain-text extracts).

use super::{PageSource, SearchProvider, SearchResult};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Addresses of one wiki: API endpoint and article URL base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiEndpoint {
    language: String,
    host: String,
    api_url: String,
    article_base: String,
}

impl WikiEndpoint {
    /// Endpoint for `https://{language}.{host}`.
    pub fn new(language: &str, host: &str) -> Self {
        let site = format!("https://{}.{}", language, host);
        Self {
            language: language.to_string(),
            host: host.to_string(),
            api_url: format!("{}/w/api.php", site),
            article_base: format!("{}/wiki/", site),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.wiki.language, &settings.wiki.host)
    }

    /// Point API calls somewhere else (a mock server in tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Canonical article URL for a title.
    pub fn article_url(&self, title: &str) -> String {
        let slug = title.trim().replace(' ', "_");
        format!("{}{}", self.article_base, urlencoding::encode(&slug))
    }

    /// Return the article title if `input` is an article URL on this wiki.
    ///
    /// Accepts `/wiki/<Title>` paths and `index.php?title=<Title>` links on
    /// `{language}.{host}` or its mobile site `{language}.m.{host}`.
    pub fn article_title(&self, input: &str) -> Option<String> {
        let url = Url::parse(input.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let host = url.host_str()?.to_ascii_lowercase();
        let desktop = format!("{}.{}", self.language, self.host).to_ascii_lowercase();
        let mobile = format!("{}.m.{}", self.language, self.host).to_ascii_lowercase();
        if host != desktop && host != mobile {
            return None;
        }

        title_from_url(&url)
    }
}

/// Extract and percent-decode the title part of a wiki URL.
///
/// Only `/wiki/<Title>` paths and a `title=` query count; any other path
/// (`/w/index.php` alone, `/`) has no title.
pub(crate) fn title_from_url(url: &Url) -> Option<String> {
    let raw = if let Some(rest) = url.path().strip_prefix("/wiki/") {
        rest.to_string()
    } else {
        let (_, title) = url.query_pairs().find(|(k, _)| k == "title")?;
        return Some(title.trim().to_string()).filter(|t| !t.is_empty());
    };

    let decoded = urlencoding::decode(&raw).ok()?.into_owned();
    let decoded = decoded.trim().to_string();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Page data as reported by the extracts query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePayload {
    /// Canonical title after redirects.
    pub title: String,
    /// Plain-text extract with `== Heading ==` section markers.
    pub extract: Option<String>,
    pub is_disambiguation: bool,
    /// Titles of main-namespace pages this page links to.
    pub links: Vec<String>,
}

/// HTTP client for one wiki.
pub struct WikiClient {
    http: reqwest::Client,
    endpoint: WikiEndpoint,
}

impl WikiClient {
    /// Create a client with its own connection pool.
    pub fn new(endpoint: WikiEndpoint, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(WikiEndpoint::from_settings(settings), &settings.wiki.user_agent)
    }

    pub fn endpoint(&self) -> &WikiEndpoint {
        &self.endpoint
    }

    async fn get_json(&self, params: &[(&str, &str)], timeout: Duration) -> Result<serde_json::Value> {
        let url = self.endpoint.api_url();
        debug!(url = %url, ?params, "GET");

        let response = self
            .http
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| WikiVoxError::network(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiVoxError::http_status(url, status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WikiVoxError::network(url, &e))?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| WikiVoxError::Api(format!("Invalid JSON from {}: {}", url, e)))?;

        if let Some(error) = value.get("error") {
            let info = error["info"].as_str().unwrap_or("unknown error");
            return Err(WikiVoxError::Api(format!("MediaWiki error: {}", info)));
        }

        Ok(value)
    }
}

#[async_trait]
impl SearchProvider for WikiClient {
    #[instrument(skip(self), fields(query = %query))]
    async fn search(&self, query: &str, limit: u32, timeout: Duration) -> Result<Vec<SearchResult>> {
        let limit = limit.to_string();
        let params = [
            ("action", "opensearch"),
            ("search", query),
            ("limit", limit.as_str()),
            ("namespace", "0"),
            ("format", "json"),
        ];
        let value = self.get_json(&params, timeout).await?;
        let results = parse_opensearch(value)?;
        debug!("Search returned {} results", results.len());
        Ok(results)
    }
}

#[async_trait]
impl PageSource for WikiClient {
    #[instrument(skip(self), fields(title = %title))]
    async fn fetch_page(&self, title: &str, lead_only: bool, timeout: Duration) -> Result<PagePayload> {
        let mut params = vec![
            ("action", "query"),
            ("prop", "extracts|pageprops|links"),
            ("explaintext", "1"),
            ("exsectionformat", "wiki"),
            ("ppprop", "disambiguation"),
            ("plnamespace", "0"),
            ("pllimit", "max"),
            ("redirects", "1"),
            ("titles", title),
            ("formatversion", "2"),
            ("format", "json"),
        ];
        if lead_only {
            params.push(("exintro", "1"));
        }

        let value = self.get_json(&params, timeout).await.map_err(|e| match e {
            WikiVoxError::Network {
                status: Some(404), ..
            } => WikiVoxError::NotFound {
                query: title.to_string(),
            },
            other => other,
        })?;

        parse_query_response(value, title)
    }

    fn article_url(&self, title: &str) -> String {
        self.endpoint.article_url(title)
    }
}

/// Parse an opensearch response: `[term, [titles], [descriptions], [urls]]`.
pub(crate) fn parse_opensearch(value: serde_json::Value) -> Result<Vec<SearchResult>> {
    let (_term, titles, descriptions, urls): (String, Vec<String>, Vec<String>, Vec<String>) =
        serde_json::from_value(value)
            .map_err(|e| WikiVoxError::Api(format!("Malformed search response: {}", e)))?;

    Ok(titles
        .into_iter()
        .zip(urls)
        .enumerate()
        .map(|(rank, (title, url))| {
            let snippet = descriptions.get(rank).cloned().unwrap_or_default();
            SearchResult::new(title, snippet.trim(), url, rank)
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageObject>,
}

#[derive(Debug, Deserialize)]
struct PageObject {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    title: String,
}

/// Parse a `formatversion=2` extracts query into a [`PagePayload`].
pub(crate) fn parse_query_response(value: serde_json::Value, requested: &str) -> Result<PagePayload> {
    let response: QueryResponse = serde_json::from_value(value)
        .map_err(|e| WikiVoxError::Api(format!("Malformed page response: {}", e)))?;

    let not_found = || WikiVoxError::NotFound {
        query: requested.to_string(),
    };

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(not_found)?;

    if page.missing || page.invalid {
        return Err(not_found());
    }

    let is_disambiguation = page
        .pageprops
        .as_ref()
        .is_some_and(|p| p.disambiguation.is_some());

    Ok(PagePayload {
        title: if page.title.is_empty() {
            requested.to_string()
        } else {
            page.title
        },
        extract: page.extract,
        is_disambiguation,
        links: page.links.into_iter().map(|l| l.title).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> WikiEndpoint {
        WikiEndpoint::new("en", "wikipedia.org")
    }

    #[test]
    fn test_article_title_from_urls() {
        let ep = endpoint();
        assert_eq!(
            ep.article_title("https://en.wikipedia.org/wiki/Homer"),
            Some("Homer".to_string())
        );
        assert_eq!(
            ep.article_title("https://en.m.wikipedia.org/wiki/Wars_of_the_Roses"),
            Some("Wars_of_the_Roses".to_string())
        );
        assert_eq!(
            ep.article_title("https://en.wikipedia.org/wiki/Caf%C3%A9"),
            Some("Café".to_string())
        );
        assert_eq!(
            ep.article_title("https://en.wikipedia.org/w/index.php?title=Homer&oldid=1"),
            Some("Homer".to_string())
        );
    }

    #[test]
    fn test_article_title_rejects_other_inputs() {
        let ep = endpoint();
        assert_eq!(ep.article_title("war fo the rose"), None);
        assert_eq!(ep.article_title("https://example.com/wiki/Homer"), None);
        assert_eq!(ep.article_title("ftp://en.wikipedia.org/wiki/Homer"), None);
        assert_eq!(ep.article_title("https://en.wikipedia.org/wiki/"), None);
        assert_eq!(ep.article_title("https://notwikipedia.org/wiki/Homer"), None);
    }

    #[test]
    fn test_article_title_only_on_configured_language() {
        let ep = endpoint();
        assert_eq!(ep.article_title("https://de.wikipedia.org/wiki/K%C3%B6ln"), None);
        assert_eq!(ep.article_title("https://de.m.wikipedia.org/wiki/K%C3%B6ln"), None);
        assert_eq!(ep.article_title("https://wikipedia.org/wiki/Homer"), None);
        assert_eq!(ep.article_title("https://commons.wikipedia.org/wiki/Homer"), None);
        assert_eq!(
            ep.article_title("https://en.m.wikipedia.org/wiki/Homer"),
            Some("Homer".to_string())
        );
        assert_eq!(
            ep.article_title("https://EN.Wikipedia.org/wiki/Homer"),
            Some("Homer".to_string())
        );

        let de = WikiEndpoint::new("de", "wikipedia.org");
        assert_eq!(
            de.article_title("https://de.wikipedia.org/wiki/K%C3%B6ln"),
            Some("Köln".to_string())
        );
    }

    #[test]
    fn test_article_title_needs_wiki_path_or_title_query() {
        let ep = endpoint();
        assert_eq!(ep.article_title("https://en.wikipedia.org/w/index.php"), None);
        assert_eq!(ep.article_title("https://en.wikipedia.org/Homer"), None);
        assert_eq!(ep.article_title("https://en.wikipedia.org/w/index.php?title=%20"), None);
    }

    #[test]
    fn test_article_url_round_trips_title() {
        let ep = endpoint();
        let url = ep.article_url("Mercury (planet)");
        assert!(url.starts_with("https://en.wikipedia.org/wiki/Mercury_"));
        assert_eq!(ep.article_title(&url), Some("Mercury_(planet)".to_string()));
    }

    #[test]
    fn test_parse_opensearch_keeps_order() {
        let value = json!([
            "mercury",
            ["Mercury (planet)", "Mercury (element)"],
            ["Smallest planet", ""],
            [
                "https://en.wikipedia.org/wiki/Mercury_(planet)",
                "https://en.wikipedia.org/wiki/Mercury_(element)"
            ]
        ]);
        let results = parse_opensearch(value).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Mercury (planet)");
        assert_eq!(results[0].snippet, "Smallest planet");
        assert_eq!(results[1].snippet, "");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_parse_opensearch_empty_and_malformed() {
        assert!(parse_opensearch(json!(["x", [], [], []])).unwrap().is_empty());
        assert!(matches!(
            parse_opensearch(json!({"unexpected": true})),
            Err(WikiVoxError::Api(_))
        ));
    }

    #[test]
    fn test_parse_query_article() {
        let value = json!({
            "query": {"pages": [{
                "pageid": 1, "title": "Homer",
                "extract": "Homer was a poet.\n\n== Life ==\nLittle is known."
            }]}
        });
        let payload = parse_query_response(value, "Homer").unwrap();
        assert_eq!(payload.title, "Homer");
        assert!(!payload.is_disambiguation);
        assert!(payload.extract.unwrap().contains("== Life =="));
    }

    #[test]
    fn test_parse_query_disambiguation() {
        let value = json!({
            "query": {"pages": [{
                "title": "Mercury",
                "extract": "Mercury may refer to:",
                "pageprops": {"disambiguation": ""},
                "links": [{"ns": 0, "title": "Mercury (planet)"}, {"ns": 0, "title": "Mercury (element)"}]
            }]}
        });
        let payload = parse_query_response(value, "Mercury").unwrap();
        assert!(payload.is_disambiguation);
        assert_eq!(payload.links, vec!["Mercury (planet)", "Mercury (element)"]);
    }

    #[test]
    fn test_parse_query_missing_page() {
        let value = json!({"query": {"pages": [{"title": "Nope", "missing": true}]}});
        assert!(matches!(
            parse_query_response(value, "Nope"),
            Err(WikiVoxError::NotFound { .. })
        ));
        assert!(matches!(
            parse_query_response(json!({"batchcomplete": true}), "Nope"),
            Err(WikiVoxError::NotFound { .. })
        ));
    }
}
