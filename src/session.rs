//! The browsing session: one event loop driving a [`Feed`].
//!
//! Three things wake the loop, multiplexed with `tokio::select!`:
//!
//! - a [`FeedEvent`] from the front end (scroll, search, filters, save, quit)
//! - a fetch completion from a spawned aggregator task
//! - the end of the search debounce quiet period
//!
//! All feed state is touched only from the loop itself, between suspension
//! points. Fetches run as spawned tasks and report back over a channel; the
//! feed's cursor guarantees there is never more than one.
//!
//! Search text filters the accumulated list at once but reaches the
//! providers only after [`SEARCH_DEBOUNCE`] without further typing. Date
//! changes re-query immediately. Saving preferences ends the session with
//! [`SessionExit::Reload`]; the caller starts a new session, which picks the
//! saved selections up as its defaults.

use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, instrument};

use crate::aggregator::Aggregator;
use crate::error::{FeedError, StoreError};
use crate::feed::{Feed, FeedSnapshot, FetchCompletion, FetchTicket};
use crate::models::{Article, FacetKind, FeedQuery, FilterCriteria};
use crate::preferences::PreferenceStore;

/// Quiet period before a search edit reaches the providers.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Input from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Explicit "load more".
    LoadMore,
    /// The sentinel after the list came into view.
    SentinelVisible,
    Search(String),
    DateFrom(Option<NaiveDate>),
    DateTo(Option<NaiveDate>),
    /// Both bounds at once, re-querying a single time.
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
    /// Select or deselect one facet value, by slug.
    Toggle(FacetKind, String),
    Clear(FacetKind),
    /// Scroll the view by a number of pixels.
    Scroll(i32),
    ShowFacets,
    SavePreferences,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Quit,
    /// Preferences were saved; start over from the store.
    Reload,
}

/// Where snapshots are drawn.
pub trait FeedView: Send {
    /// Draw `snapshot`. Returns true when the sentinel has just come into
    /// view and the next page should be requested.
    fn render(&mut self, snapshot: &FeedSnapshot) -> bool;

    fn scroll(&mut self, _delta: i32) {}

    fn show_facets(&mut self, _snapshot: &FeedSnapshot) {}
}

struct Completion {
    ticket: FetchTicket,
    result: Result<Vec<Article>, FeedError>,
}

pub struct Session<V> {
    feed: Feed,
    aggregator: Aggregator,
    preferences: PreferenceStore,
    view: V,
    search_deadline: Option<Instant>,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<V: FeedView> Session<V> {
    /// Build a session whose criteria default to the saved preferences.
    ///
    /// # Errors
    ///
    /// Fails if the persisted preferences or facet lists cannot be read or
    /// do not parse.
    #[instrument(level = "info", skip_all)]
    pub async fn start(aggregator: Aggregator, preferences: PreferenceStore, view: V) -> Result<Self, StoreError> {
        let saved = preferences.load().await?;
        let stored_facets = preferences.load_catalog().await?;
        let criteria = FilterCriteria::from_preferences(saved.as_ref());
        info!(
            sources = ?criteria.sources,
            categories = ?criteria.categories,
            authors = ?criteria.authors,
            "Session starting"
        );

        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Ok(Self {
            feed: Feed::new(criteria, stored_facets),
            aggregator,
            preferences,
            view,
            search_deadline: None,
            done_tx,
            done_rx,
        })
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Load the first page and process events until quit or reload.
    ///
    /// A closed event channel counts as quit.
    ///
    /// # Errors
    ///
    /// Only saving preferences can fail the session.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<FeedEvent>) -> Result<SessionExit, FeedError> {
        self.trigger_fetch();
        self.render();

        loop {
            let deadline = self.search_deadline;
            tokio::select! {
                Some(done) = self.done_rx.recv() => self.on_completion(done).await,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => self.requery(),
                event = events.recv() => {
                    let Some(event) = event else {
                        return Ok(SessionExit::Quit);
                    };
                    if let Some(exit) = self.on_event(event).await? {
                        return Ok(exit);
                    }
                }
            }
            self.render();
        }
    }

    async fn on_event(&mut self, event: FeedEvent) -> Result<Option<SessionExit>, FeedError> {
        debug!(?event, "Event");
        match event {
            FeedEvent::LoadMore | FeedEvent::SentinelVisible => {
                self.trigger_fetch();
            }
            FeedEvent::Search(text) => {
                self.feed.criteria_mut().search = text;
                self.search_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
            }
            FeedEvent::DateFrom(day) => {
                self.feed.criteria_mut().date_from = day;
                self.requery();
            }
            FeedEvent::DateTo(day) => {
                self.feed.criteria_mut().date_to = day;
                self.requery();
            }
            FeedEvent::DateRange(from, to) => {
                let criteria = self.feed.criteria_mut();
                criteria.date_from = from;
                criteria.date_to = to;
                self.requery();
            }
            FeedEvent::Toggle(kind, slug) => self.feed.criteria_mut().toggle(kind, &slug),
            FeedEvent::Clear(kind) => self.feed.criteria_mut().clear_facet(kind),
            FeedEvent::Scroll(delta) => self.view.scroll(delta),
            FeedEvent::ShowFacets => {
                let snapshot = self.feed.snapshot();
                self.view.show_facets(&snapshot);
            }
            FeedEvent::SavePreferences => {
                self.preferences.save(&self.feed.criteria().preferences()).await?;
                info!("Preferences saved; reloading");
                return Ok(Some(SessionExit::Reload));
            }
            FeedEvent::Quit => return Ok(Some(SessionExit::Quit)),
        }
        Ok(None)
    }

    /// Align the fetch query with the criteria, starting over if it changed.
    fn requery(&mut self) {
        self.search_deadline = None;
        let query = FeedQuery::from_criteria(self.feed.criteria());
        if self.feed.reset_query(query) {
            self.trigger_fetch();
        }
    }

    /// Spawn the next page fetch if the cursor allows one.
    fn trigger_fetch(&mut self) -> bool {
        let Some(ticket) = self.feed.begin_fetch() else {
            debug!(
                fetching = self.feed.is_fetching(),
                has_more = self.feed.pagination().has_more,
                "Fetch trigger dropped"
            );
            return false;
        };

        let aggregator = self.aggregator.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let query = ticket.query.clone();
            let page = ticket.page;
            let result = tokio::spawn(async move { aggregator.fetch_page(&query, page).await })
                .await
                .map_err(FeedError::from);
            // Fails only once the session is gone.
            let _ = done.send(Completion { ticket, result });
        });
        true
    }

    async fn on_completion(&mut self, done: Completion) {
        let Completion { ticket, result } = done;
        match result {
            Ok(articles) => match self.feed.complete_fetch(ticket, articles) {
                FetchCompletion::Stale => {
                    self.trigger_fetch();
                }
                FetchCompletion::Merged {
                    facets: Some(catalog), ..
                } => {
                    if let Err(e) = self.preferences.save_catalog(&catalog).await {
                        error!(error = %e, "Failed to persist facet lists");
                    }
                }
                FetchCompletion::Merged { .. } | FetchCompletion::Exhausted => {}
            },
            Err(e) => {
                if !self.feed.fail_fetch(&ticket, &e) {
                    self.trigger_fetch();
                }
            }
        }
    }

    fn render(&mut self) {
        let snapshot = self.feed.snapshot();
        if self.view.render(&snapshot) && self.trigger_fetch() {
            self.view.render(&self.feed.snapshot());
        }
    }
}
