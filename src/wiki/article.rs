//! Raw article content as returned by the fetcher.

use super::SearchResult;
use crate::error::{Result, WikiVoxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Heading used for the text before the first heading.
pub const LEAD_HEADING: &str = "Introduction";

/// One section of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    /// Heading depth. 0 is the lead section, which has no heading of its own;
    /// `== X ==` in wikitext is level 2, `=== X ===` level 3 and so on.
    pub level: u8,
    pub body: String,
}

impl Section {
    pub fn new(heading: impl Into<String>, level: u8, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            level,
            body: body.into(),
        }
    }

    pub fn lead(body: impl Into<String>) -> Self {
        Self::new(LEAD_HEADING, 0, body)
    }

    pub fn is_lead(&self) -> bool {
        self.level == 0
    }
}

/// Article text split into ordered sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub sections: Vec<Section>,
}

impl RawArticle {
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            sections,
        }
    }

    /// Keep only the sections picked by `selection`, in article order.
    pub fn select_sections(&self, selection: &SectionSelection) -> Result<RawArticle> {
        match selection {
            SectionSelection::All => Ok(self.clone()),
            SectionSelection::Indices(indices) => {
                if let Some(&bad) = indices.iter().find(|&&i| i == 0 || i > self.sections.len()) {
                    return Err(WikiVoxError::InvalidInput(format!(
                        "Section {} does not exist (article has {} sections)",
                        bad,
                        self.sections.len()
                    )));
                }
                let sections = indices
                    .iter()
                    .map(|&i| self.sections[i - 1].clone())
                    .collect();
                Ok(RawArticle::new(self.title.clone(), sections))
            }
        }
    }
}

/// Outcome of fetching a page: a real article or a disambiguation page.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedPage {
    Article(RawArticle),
    /// A disambiguation page, with its links re-expressed as search results.
    Disambiguation {
        title: String,
        candidates: Vec<SearchResult>,
    },
}

impl FetchedPage {
    pub fn is_disambiguation(&self) -> bool {
        matches!(self, FetchedPage::Disambiguation { .. })
    }

    /// Convert into an article, surfacing a disambiguation page as an error.
    pub fn into_article(self) -> Result<RawArticle> {
        match self {
            FetchedPage::Article(article) => Ok(article),
            FetchedPage::Disambiguation { title, candidates } => {
                Err(WikiVoxError::Disambiguation { title, candidates })
            }
        }
    }
}

/// Which sections to keep, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionSelection {
    #[default]
    All,
    /// Sorted, deduplicated section numbers.
    Indices(Vec<usize>),
}

impl std::str::FromStr for SectionSelection {
    type Err = WikiVoxError;

    /// Parse `all` or a list like `1, 3-4`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(SectionSelection::All);
        }

        let invalid = || WikiVoxError::InvalidInput(format!("Invalid section selection: '{}'", s));
        let mut picked = BTreeSet::new();

        for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let start: usize = start.trim().parse().map_err(|_| invalid())?;
                    let end: usize = end.trim().parse().map_err(|_| invalid())?;
                    if start == 0 || end < start {
                        return Err(invalid());
                    }
                    picked.extend(start..=end);
                }
                None => {
                    let index: usize = part.parse().map_err(|_| invalid())?;
                    if index == 0 {
                        return Err(invalid());
                    }
                    picked.insert(index);
                }
            }
        }

        if picked.is_empty() {
            return Err(invalid());
        }
        Ok(SectionSelection::Indices(picked.into_iter().collect()))
    }
}
