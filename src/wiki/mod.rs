//! Wikipedia article resolution and retrieval.
//!
//! Resolution turns free text or a URL into one [`ArticleIdentifier`];
//! fetching turns an identifier into a [`RawArticle`]. Both talk to the wiki
//! through the [`SearchProvider`] and [`PageSource`] traits so tests can
//! substitute fixed data.

mod article;
mod client;
mod fetcher;
mod resolver;

pub use article::{FetchedPage, RawArticle, Section, SectionSelection, LEAD_HEADING};
pub use client::{PagePayload, WikiClient, WikiEndpoint};
pub use fetcher::{ArticleFetcher, FetchOptions};
pub use resolver::{ArticleResolver, ResolveOptions};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One ranked hit from the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// Short description; may be empty.
    pub snippet: String,
    pub url: String,
    /// Implicit rank score: 1.0 for the top hit, decreasing with rank.
    pub score: f32,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, url: impl Into<String>, rank: usize) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
            score: 1.0 / (rank as f32 + 1.0),
        }
    }
}

/// How an article was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Url,
    Title,
}

/// A resolved, canonical reference to one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl ArticleIdentifier {
    pub fn url(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Url,
            value: value.into(),
        }
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Title,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for ArticleIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Ranked free-text search over article titles.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `limit` results in provider rank order.
    async fn search(&self, query: &str, limit: u32, timeout: Duration) -> Result<Vec<SearchResult>>;
}

/// Retrieval of article content by title.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page. Fails with `NotFound` when the page does not exist.
    async fn fetch_page(&self, title: &str, lead_only: bool, timeout: Duration) -> Result<PagePayload>;

    /// Canonical article URL for a title.
    fn article_url(&self, title: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_follows_rank() {
        let first = SearchResult::new("A", "", "u", 0);
        let third = SearchResult::new("C", "", "u", 2);
        assert_eq!(first.score, 1.0);
        assert!(third.score < first.score);
    }

    #[test]
    fn test_identifier_display() {
        let id = ArticleIdentifier::url("https://en.wikipedia.org/wiki/Homer");
        assert_eq!(id.to_string(), "https://en.wikipedia.org/wiki/Homer");
        assert_eq!(id.kind, IdentifierKind::Url);
    }
}
