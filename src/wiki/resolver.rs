//! Turning user input into exactly one article identifier.

use super::{ArticleIdentifier, SearchProvider, WikiEndpoint};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Options for a single resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Pick the top-ranked hit when the search is ambiguous.
    pub auto_select: bool,
    /// Maximum number of search results. Must be greater than zero.
    pub search_limit: u32,
    pub timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            auto_select: false,
            search_limit: 10,
            timeout: Duration::from_secs(15),
        }
    }
}

impl ResolveOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            auto_select: settings.search.auto_select,
            search_limit: settings.search.limit,
            timeout: settings.http_timeout(),
        }
    }
}

/// Resolves URLs directly and free text through search.
pub struct ArticleResolver {
    endpoint: WikiEndpoint,
    search: Arc<dyn SearchProvider>,
}

impl ArticleResolver {
    pub fn new(endpoint: WikiEndpoint, search: Arc<dyn SearchProvider>) -> Self {
        Self { endpoint, search }
    }

    /// Resolve `input` to one article.
    ///
    /// Article URLs for the configured wiki are returned as-is without any
    /// search request. Otherwise zero hits fail with `NotFound`, a single hit
    /// is always taken, and several hits are either narrowed to the top rank
    /// (`auto_select`) or returned as `AmbiguousSelection` in provider order.
    #[instrument(skip(self, options), fields(input = %input))]
    pub async fn resolve(&self, input: &str, options: &ResolveOptions) -> Result<ArticleIdentifier> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WikiVoxError::InvalidInput("Empty article query".to_string()));
        }

        if self.endpoint.article_title(input).is_some() {
            info!("Input is an article URL, skipping search");
            return Ok(ArticleIdentifier::url(input));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            return Err(WikiVoxError::InvalidInput(format!(
                "'{}' is not an article URL for {}",
                input,
                self.endpoint.api_url()
            )));
        }

        if options.search_limit == 0 {
            return Err(WikiVoxError::InvalidInput(
                "Search limit must be greater than zero".to_string(),
            ));
        }

        let mut results = self
            .search
            .search(input, options.search_limit, options.timeout)
            .await?;

        match results.len() {
            0 => Err(WikiVoxError::NotFound {
                query: input.to_string(),
            }),
            1 => {
                let only = results.remove(0);
                info!("Found exact match: {}", only.title);
                Ok(ArticleIdentifier::url(only.url))
            }
            n if options.auto_select => {
                let top = results.remove(0);
                info!("Auto-selected '{}' out of {} results", top.title, n);
                Ok(ArticleIdentifier::url(top.url))
            }
            n => {
                info!("{} results for '{}', caller must choose", n, input);
                Err(WikiVoxError::AmbiguousSelection {
                    query: input.to_string(),
                    candidates: results,
                })
            }
        }
    }
}
