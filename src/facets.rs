//! Filter options derived from the articles seen so far.
//!
//! Facets are extracted once per session, from the first non-empty state of
//! the article store, and then frozen: later pages never add values even if
//! they introduce new sources, categories or authors. Each list holds at most
//! [`MAX_FACET_VALUES`] distinct values in the order they first appear in the
//! store.

use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::models::{Article, FacetEntry, FacetKind};

pub const MAX_FACET_VALUES: usize = 15;

/// Known values for every facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCatalog {
    pub sources: Vec<FacetEntry>,
    pub categories: Vec<FacetEntry>,
    pub authors: Vec<FacetEntry>,
}

impl FacetCatalog {
    /// Derive facet lists from `articles`. Missing authors are ignored.
    pub fn extract(articles: &[Article]) -> Self {
        Self {
            sources: distinct(FacetKind::Source, articles.iter().map(|a| a.source.as_str())),
            categories: distinct(FacetKind::Category, articles.iter().map(|a| a.category.as_str())),
            authors: distinct(FacetKind::Author, articles.iter().filter_map(|a| a.author.as_deref())),
        }
    }

    pub fn entries(&self, kind: FacetKind) -> &[FacetEntry] {
        match kind {
            FacetKind::Source => &self.sources,
            FacetKind::Category => &self.categories,
            FacetKind::Author => &self.authors,
        }
    }

    pub fn is_empty(&self) -> bool {
        FacetKind::ALL.iter().all(|k| self.entries(*k).is_empty())
    }
}

fn distinct<'a>(kind: FacetKind, values: impl Iterator<Item = &'a str>) -> Vec<FacetEntry> {
    values
        .filter(|v| !v.is_empty())
        .unique()
        .take(MAX_FACET_VALUES)
        .map(|v| FacetEntry::new(kind, v))
        .collect()
}

/// One-shot facet derivation for a session.
#[derive(Debug, Default)]
pub struct FacetExtractor {
    catalog: Option<FacetCatalog>,
}

impl FacetExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract facets from `articles` unless that already happened.
    ///
    /// Returns the catalog only on the call that produced it, so the caller
    /// knows when to persist. Empty input never triggers extraction.
    pub fn observe(&mut self, articles: &[Article]) -> Option<&FacetCatalog> {
        if self.catalog.is_some() || articles.is_empty() {
            return None;
        }
        let catalog = FacetCatalog::extract(articles);
        info!(
            sources = catalog.sources.len(),
            categories = catalog.categories.len(),
            authors = catalog.authors.len(),
            "Derived filter facets"
        );
        self.catalog = Some(catalog);
        self.catalog.as_ref()
    }

    pub fn catalog(&self) -> Option<&FacetCatalog> {
        self.catalog.as_ref()
    }
}
