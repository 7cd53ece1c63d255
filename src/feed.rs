//! The infinite feed: pagination cursor, accumulated store, facets and the
//! live filter criteria, owned together so every transition keeps them
//! consistent.
//!
//! # Cursor
//!
//! The cursor is `Idle` or `Fetching`. [`Feed::begin_fetch`] moves
//! Idle→Fetching and hands out a [`FetchTicket`]; a second trigger while a
//! ticket is outstanding, or after the feed is exhausted, yields `None` and
//! is dropped by the caller. At most one fetch is ever in flight.
//!
//! Every ticket carries the generation of the query it was issued under.
//! [`Feed::reset_query`] bumps the generation, so a fetch that was in flight
//! when the search or dates changed completes as [`FetchCompletion::Stale`]
//! and its articles are discarded instead of being merged into the new
//! result list.
//!
//! # Pagination
//!
//! A completed fetch with at least one article is merged and advances the
//! page counter. An empty fetch marks the feed exhausted; no further fetch is
//! issued for that query.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::facets::{FacetCatalog, FacetExtractor};
use crate::filter;
use crate::models::{Article, FeedQuery, FilterCriteria, PaginationState};
use crate::store::ArticleStore;

/// Whether a fetch is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    /// Waiting on the fetch issued under `generation`.
    Fetching { generation: u64 },
}

/// Permission to fetch one page, tagged with the query it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    pub query: FeedQuery,
    pub generation: u64,
}

/// What a completed fetch did to the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchCompletion {
    /// Issued under an older query; nothing was merged.
    Stale,
    /// The page was empty; the feed has no more pages.
    Exhausted,
    Merged {
        /// Previously unseen articles contributed by the page.
        added: usize,
        /// Set only on the fetch that first populated the store.
        facets: Option<FacetCatalog>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    /// Nothing accumulated yet and a page is pending.
    Loading,
    /// The last fetch failed as a whole; replaces the list.
    Error,
    /// No accumulated article passes the filters.
    Empty,
    Ready,
}

/// Everything a view needs to draw the feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    /// Filtered articles, newest first.
    pub articles: Vec<Article>,
    /// Accumulated articles before filtering.
    pub total: usize,
    pub facets: FacetCatalog,
    pub criteria: FilterCriteria,
    pub pagination: PaginationState,
    pub fetching: bool,
    /// Whether the "load more" sentinel follows the list.
    pub show_sentinel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct Feed {
    query: FeedQuery,
    generation: u64,
    pagination: PaginationState,
    state: CursorState,
    store: ArticleStore,
    extractor: FacetExtractor,
    /// Facet lists persisted by an earlier session, shown until this
    /// session extracts its own.
    stored_facets: FacetCatalog,
    criteria: FilterCriteria,
    last_error: Option<String>,
}

impl Feed {
    /// A fresh feed whose criteria start from `criteria`.
    ///
    /// The initial query takes the criteria's search text and dates.
    pub fn new(criteria: FilterCriteria, stored_facets: FacetCatalog) -> Self {
        Self {
            query: FeedQuery::from_criteria(&criteria),
            generation: 0,
            pagination: PaginationState::default(),
            state: CursorState::Idle,
            store: ArticleStore::new(),
            extractor: FacetExtractor::new(),
            stored_facets,
            criteria,
            last_error: None,
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, CursorState::Fetching { .. })
    }

    pub fn articles(&self) -> &[Article] {
        self.store.articles()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Local filter changes. These never touch the query or the cursor.
    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        &mut self.criteria
    }

    /// Facets extracted this session, else the persisted ones.
    pub fn facets(&self) -> &FacetCatalog {
        self.extractor.catalog().unwrap_or(&self.stored_facets)
    }

    /// Idle→Fetching. `None` when a fetch is in flight or no pages remain.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.is_fetching() || !self.pagination.has_more {
            return None;
        }
        self.state = CursorState::Fetching {
            generation: self.generation,
        };
        Some(FetchTicket {
            page: self.pagination.page,
            query: self.query.clone(),
            generation: self.generation,
        })
    }

    /// Settle the cursor after a fetch finished, whatever its outcome.
    /// Returns false if the ticket belongs to an older query.
    fn settle(&mut self, ticket: &FetchTicket) -> bool {
        if self.state == (CursorState::Fetching { generation: ticket.generation }) {
            self.state = CursorState::Idle;
        }
        ticket.generation == self.generation
    }

    /// Fetching→Idle with the page's articles.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, articles: Vec<Article>) -> FetchCompletion {
        if !self.settle(&ticket) {
            debug!(
                page = ticket.page,
                count = articles.len(),
                "Discarding page fetched for a previous query"
            );
            return FetchCompletion::Stale;
        }
        self.last_error = None;

        if articles.is_empty() {
            self.pagination.has_more = false;
            info!(page = ticket.page, "No more articles");
            return FetchCompletion::Exhausted;
        }

        let added = self.store.merge(articles);
        self.pagination.page += 1;
        let facets = self.extractor.observe(self.store.articles()).cloned();
        info!(
            page = ticket.page,
            added,
            total = self.store.len(),
            "Merged page"
        );
        FetchCompletion::Merged { added, facets }
    }

    /// Fetching→Idle after the aggregated fetch itself failed.
    ///
    /// Returns false, and leaves the feed untouched, for a stale ticket.
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, error: &FeedError) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        warn!(page = ticket.page, error = %error, "Fetch failed");
        self.last_error = Some(error.to_string());
        true
    }

    /// Switch to a new query identity.
    ///
    /// A changed query starts over at page 1 with an empty store. An
    /// outstanding fetch keeps the cursor busy until it lands, and is then
    /// discarded as stale. Returns whether anything changed.
    pub fn reset_query(&mut self, query: FeedQuery) -> bool {
        if query == self.query {
            return false;
        }
        info!(search = %query.search, from = ?query.date_from, to = ?query.date_to, "Query changed");
        self.query = query;
        self.generation += 1;
        self.pagination = PaginationState::default();
        self.store.clear();
        self.last_error = None;
        true
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let articles = filter::apply(&self.criteria, self.store.articles());
        let fetching = self.is_fetching();
        let status = if self.last_error.is_some() {
            FeedStatus::Error
        } else if self.store.is_empty() && self.pagination.has_more {
            FeedStatus::Loading
        } else if articles.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Ready
        };
        let show_sentinel = !articles.is_empty() && (self.pagination.has_more || fetching);
        FeedSnapshot {
            status,
            total: self.store.len(),
            articles,
            facets: self.facets().clone(),
            criteria: self.criteria.clone(),
            pagination: self.pagination,
            fetching,
            show_sentinel,
            error: self.last_error.clone(),
        }
    }
}
