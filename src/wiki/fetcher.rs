//! Fetching article content for a resolved identifier.

use super::client::title_from_url;
use super::{ArticleIdentifier, FetchedPage, IdentifierKind, PageSource, RawArticle, SearchResult, Section};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use crate::retry::RetryPolicy;
use crate::text::split_wikitext_sections;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Options for a single fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Only request the introduction.
    pub lead_only: bool,
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            lead_only: false,
            timeout: Duration::from_secs(15),
            max_retries: 3,
        }
    }
}

impl FetchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lead_only: settings.general.lead_only,
            timeout: settings.http_timeout(),
            max_retries: settings.wiki.max_retries,
        }
    }
}

/// Stateless article fetcher. Safe to call repeatedly with the same identifier.
pub struct ArticleFetcher {
    source: Arc<dyn PageSource>,
    backoff_base: Duration,
}

impl ArticleFetcher {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self::with_backoff(source, Duration::from_millis(500))
    }

    pub fn with_backoff(source: Arc<dyn PageSource>, backoff_base: Duration) -> Self {
        Self {
            source,
            backoff_base,
        }
    }

    /// Fetch an article, failing with `Disambiguation` for disambiguation pages.
    pub async fn fetch(&self, id: &ArticleIdentifier, options: &FetchOptions) -> Result<RawArticle> {
        self.fetch_page(id, options).await?.into_article()
    }

    /// Fetch a page and classify it as article or disambiguation page.
    ///
    /// Transient failures are retried with backoff up to `max_retries`;
    /// a missing page fails immediately with `NotFound`.
    #[instrument(skip(self, options), fields(id = %id))]
    pub async fn fetch_page(&self, id: &ArticleIdentifier, options: &FetchOptions) -> Result<FetchedPage> {
        let title = identifier_title(id)?;
        let policy = RetryPolicy::new(options.max_retries + 1, self.backoff_base);
        let (lead_only, timeout) = (options.lead_only, options.timeout);
        let source = &self.source;
        let title_ref = title.as_str();

        let payload = policy
            .run("article fetch", move |_| source.fetch_page(title_ref, lead_only, timeout))
            .await?;

        if payload.is_disambiguation {
            info!("Disambiguation page detected for: {}", payload.title);
            let candidates = payload
                .links
                .iter()
                .enumerate()
                .map(|(rank, link)| SearchResult::new(link.as_str(), "", self.source.article_url(link), rank))
                .collect();
            return Ok(FetchedPage::Disambiguation {
                title: payload.title,
                candidates,
            });
        }

        let extract = payload
            .extract
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| WikiVoxError::NotFound {
                query: payload.title.clone(),
            })?;

        let mut sections: Vec<Section> = split_wikitext_sections(&extract);
        if options.lead_only {
            sections.truncate(1);
        }

        info!("Fetched '{}' ({} sections)", payload.title, sections.len());
        Ok(FetchedPage::Article(RawArticle::new(payload.title, sections)))
    }
}

/// Title to request for an identifier.
fn identifier_title(id: &ArticleIdentifier) -> Result<String> {
    match id.kind {
        IdentifierKind::Title => Ok(id.value.trim().to_string()),
        IdentifierKind::Url => {
            let url = Url::parse(&id.value).map_err(|e| {
                WikiVoxError::InvalidInput(format!("Invalid article URL '{}': {}", id.value, e))
            })?;
            title_from_url(&url).ok_or_else(|| {
                WikiVoxError::InvalidInput(format!("Could not determine page title from '{}'", id.value))
            })
        }
    }
}
