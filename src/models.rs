//! Data models shared by the adapters, the feed and the persisted store.
//!
//! - [`Article`]: the common shape every provider response is normalized to
//! - [`FacetKind`] / [`FacetEntry`]: filterable dimensions and their known values
//! - [`FilterCriteria`]: the user's current search, facet and date selections
//! - [`Preferences`]: the persisted subset of the criteria
//! - [`FeedQuery`]: the identity a page fetch is issued under
//! - [`PaginationState`]: page counter and exhaustion flag
//!
//! Persisted models serialize with the same field names the stored JSON has
//! always used (`id`, `name`, `enabled`, `prefix` for facet entries).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::slugify;

/// A news article normalized from any provider.
///
/// Articles are immutable once an adapter has built them. The `id` is derived
/// from the canonical URL, so the same story fetched twice has the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    /// Display name of the publisher, e.g. "The Guardian".
    pub source: String,
    pub category: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Text the free-text search runs against.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }

    /// Slug of the field a facet of `kind` filters on.
    ///
    /// Returns `None` only for a missing author.
    pub fn facet_slug(&self, kind: FacetKind) -> Option<String> {
        match kind {
            FacetKind::Source => Some(slugify(&self.source)),
            FacetKind::Category => Some(slugify(&self.category)),
            FacetKind::Author => self.author.as_deref().map(slugify),
        }
    }
}

/// A filterable dimension of the article list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Source,
    Category,
    Author,
}

impl FacetKind {
    pub const ALL: [FacetKind; 3] = [FacetKind::Source, FacetKind::Category, FacetKind::Author];

    /// Key the derived facet list is persisted under.
    pub fn storage_key(self) -> &'static str {
        match self {
            FacetKind::Source => "availableSources",
            FacetKind::Category => "availableCategories",
            FacetKind::Author => "availableAuthors",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FacetKind::Source => "Sources",
            FacetKind::Category => "Categories",
            FacetKind::Author => "Authors",
        }
    }
}

impl std::str::FromStr for FacetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source" | "sources" => Ok(FacetKind::Source),
            "category" | "categories" => Ok(FacetKind::Category),
            "author" | "authors" => Ok(FacetKind::Author),
            other => Err(format!("unknown facet `{other}`")),
        }
    }
}

/// One known value of a facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetEntry {
    /// Slug of `name`; the value stored in criteria and preferences.
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Which facet this entry belongs to.
    pub prefix: FacetKind,
}

impl FacetEntry {
    pub fn new(kind: FacetKind, name: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            enabled: true,
            prefix: kind,
        }
    }
}

/// Saved facet selections. Search text and dates are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// The user's current filter selections.
///
/// Facet selections are slugs kept in the order they were toggled on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search: String,
    pub sources: Vec<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Defaults for a fresh session: saved facet selections, nothing else.
    pub fn from_preferences(preferences: Option<&Preferences>) -> Self {
        let preferences = preferences.cloned().unwrap_or_default();
        Self {
            sources: preferences.sources,
            categories: preferences.categories,
            authors: preferences.authors,
            ..Self::default()
        }
    }

    pub fn selected(&self, kind: FacetKind) -> &[String] {
        match kind {
            FacetKind::Source => &self.sources,
            FacetKind::Category => &self.categories,
            FacetKind::Author => &self.authors,
        }
    }

    fn selected_mut(&mut self, kind: FacetKind) -> &mut Vec<String> {
        match kind {
            FacetKind::Source => &mut self.sources,
            FacetKind::Category => &mut self.categories,
            FacetKind::Author => &mut self.authors,
        }
    }

    /// Add `slug` to the facet selection, or remove it if already present.
    pub fn toggle(&mut self, kind: FacetKind, slug: &str) {
        let selected = self.selected_mut(kind);
        if let Some(pos) = selected.iter().position(|s| s == slug) {
            selected.remove(pos);
        } else {
            selected.push(slug.to_string());
        }
    }

    pub fn clear_facet(&mut self, kind: FacetKind) {
        self.selected_mut(kind).clear();
    }

    /// The persistable part of these criteria.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            sources: self.sources.clone(),
            categories: self.categories.clone(),
            authors: self.authors.clone(),
        }
    }
}

/// What a page fetch is issued for.
///
/// Two fetches belong to the same result list only if their queries are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub search: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FeedQuery {
    /// The query the criteria ask providers for. Search text is trimmed, so
    /// edits to surrounding whitespace never start a new result list.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            search: criteria.search.trim().to_string(),
            date_from: criteria.date_from,
            date_to: criteria.date_to,
        }
    }

    /// Trimmed search term, or `None` when the user has not searched.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// Infinite-scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Next page to request, 1-based.
    pub page: u32,
    pub has_more: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            has_more: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_entry_serialization_uses_stored_field_names() {
        let entry = FacetEntry::new(FacetKind::Source, "The Guardian");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"id":"the-guardian","name":"The Guardian","enabled":true,"prefix":"source"}"#
        );
    }

    #[test]
    fn test_preferences_deserialize_with_missing_lists() {
        let prefs: Preferences = serde_json::from_str(r#"{"sources":["bbc-news"]}"#).unwrap();
        assert_eq!(prefs.sources, vec!["bbc-news"]);
        assert!(prefs.categories.is_empty());
        assert!(prefs.authors.is_empty());
    }

    #[test]
    fn test_criteria_from_preferences() {
        let prefs = Preferences {
            sources: vec!["the-guardian".to_string()],
            categories: vec![],
            authors: vec!["jane-doe".to_string()],
        };
        let criteria = FilterCriteria::from_preferences(Some(&prefs));
        assert_eq!(criteria.sources, vec!["the-guardian"]);
        assert_eq!(criteria.authors, vec!["jane-doe"]);
        assert!(criteria.search.is_empty());
        assert!(criteria.date_from.is_none());

        assert_eq!(FilterCriteria::from_preferences(None), FilterCriteria::default());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut criteria = FilterCriteria::default();
        criteria.toggle(FacetKind::Category, "world");
        criteria.toggle(FacetKind::Category, "sport");
        assert_eq!(criteria.categories, vec!["world", "sport"]);
        criteria.toggle(FacetKind::Category, "world");
        assert_eq!(criteria.categories, vec!["sport"]);
    }

    #[test]
    fn test_facet_kind_from_str() {
        assert_eq!("Sources".parse::<FacetKind>().unwrap(), FacetKind::Source);
        assert_eq!("author".parse::<FacetKind>().unwrap(), FacetKind::Author);
        assert!("tag".parse::<FacetKind>().is_err());
    }

    #[test]
    fn test_search_term_blank() {
        let query = FeedQuery {
            search: "   ".to_string(),
            ..FeedQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn test_query_from_criteria_trims_search() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10);
        let criteria = FilterCriteria {
            search: " climate ".to_string(),
            date_to: day,
            sources: vec!["bbc-news".to_string()],
            ..FilterCriteria::default()
        };
        let query = FeedQuery::from_criteria(&criteria);
        assert_eq!(query.search, "climate");
        assert_eq!(query.date_from, None);
        assert_eq!(query.date_to, day);
        assert_eq!(
            query,
            FeedQuery::from_criteria(&FilterCriteria {
                search: "climate".to_string(),
                date_to: day,
                ..FilterCriteria::default()
            })
        );
    }
}
