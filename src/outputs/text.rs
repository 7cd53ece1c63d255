//! Plain-text rendering of the feed for the terminal.
//!
//! The terminal has no real layout, so the view simulates one: every card is
//! [`CARD_HEIGHT`] pixels tall and the "load more" sentinel sits directly
//! below the last card. Scrolling moves a viewport over that column, only
//! the cards inside the viewport are printed, and the sentinel's position is
//! fed to a [`SentinelObserver`] after each render.

use std::fmt;
use std::io;
use std::ops::Range;

use tracing::warn;

use crate::facets::FacetCatalog;
use crate::feed::{FeedSnapshot, FeedStatus};
use crate::models::{Article, FacetKind, FilterCriteria, Preferences};
use crate::session::FeedView;
use crate::visibility::{SentinelObserver, Span};

/// Simulated height of one article card, in pixels.
pub const CARD_HEIGHT: f64 = 120.0;

pub const LOADING: &str = "Loading articles...";
pub const LOADING_MORE: &str = "Loading more articles...";
pub const LOAD_ERROR: &str = "Error loading articles. Please try again later.";
pub const NO_MATCHES: &str = "No articles found matching your criteria.";
pub const END_OF_FEED: &str = "No more articles.";

/// One article card.
///
/// ```text
/// [3] Climate talks stall
///     The Guardian · World news · Jane Doe · 2024-01-10 09:00 UTC
///     https://www.theguardian.com/...
///     Negotiators left without a deal...
/// ```
pub fn write_card(out: &mut impl fmt::Write, index: usize, article: &Article) -> fmt::Result {
    writeln!(out, "[{}] {}", index + 1, article.title)?;
    let mut meta = vec![article.source.as_str(), article.category.as_str()];
    if let Some(author) = article.author.as_deref() {
        meta.push(author);
    }
    writeln!(
        out,
        "    {} · {}",
        meta.join(" · "),
        article.published_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(out, "    {}", article.url)?;
    if !article.description.is_empty() {
        writeln!(out, "    {}", article.description)?;
    }
    Ok(())
}

/// Facet values as chips, selected ones marked `[x]`.
pub fn write_facets(out: &mut impl fmt::Write, facets: &FacetCatalog, criteria: &FilterCriteria) -> fmt::Result {
    if facets.is_empty() {
        return writeln!(out, "No filters available yet.");
    }
    for kind in FacetKind::ALL {
        let entries = facets.entries(kind);
        if entries.is_empty() {
            continue;
        }
        let selected = criteria.selected(kind);
        let chips: Vec<String> = entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| {
                let mark = if selected.contains(&e.id) { 'x' } else { ' ' };
                format!("[{mark}] {} ({})", e.name, e.id)
            })
            .collect();
        writeln!(out, "{}: {}", kind.label(), chips.join("  "))?;
    }
    Ok(())
}

/// Active search, date bounds and facet selections on one line, if any.
pub fn write_criteria(out: &mut impl fmt::Write, criteria: &FilterCriteria) -> fmt::Result {
    let mut parts = Vec::new();
    if !criteria.search.is_empty() {
        parts.push(format!("search \"{}\"", criteria.search));
    }
    if let Some(from) = criteria.date_from {
        parts.push(format!("from {from}"));
    }
    if let Some(to) = criteria.date_to {
        parts.push(format!("to {to}"));
    }
    for kind in FacetKind::ALL {
        let selected = criteria.selected(kind);
        if !selected.is_empty() {
            parts.push(format!("{} {}", kind.label().to_lowercase(), selected.join(",")));
        }
    }
    if parts.is_empty() {
        return Ok(());
    }
    writeln!(out, "Filters: {}", parts.join(" | "))
}

/// The cards in `window`, framed by status lines.
pub fn write_feed(out: &mut impl fmt::Write, snapshot: &FeedSnapshot, window: Range<usize>) -> fmt::Result {
    write_criteria(out, &snapshot.criteria)?;
    match snapshot.status {
        FeedStatus::Loading => return writeln!(out, "{LOADING}"),
        FeedStatus::Error => return writeln!(out, "{LOAD_ERROR}"),
        FeedStatus::Empty => return writeln!(out, "{NO_MATCHES}"),
        FeedStatus::Ready => {}
    }

    let shown = &snapshot.articles[window.clone()];
    writeln!(
        out,
        "Showing {}-{} of {} ({} loaded)",
        window.start + 1,
        window.start + shown.len(),
        snapshot.articles.len(),
        snapshot.total
    )?;
    for (offset, article) in shown.iter().enumerate() {
        writeln!(out)?;
        write_card(out, window.start + offset, article)?;
    }
    writeln!(out)?;
    if snapshot.fetching {
        writeln!(out, "{LOADING_MORE}")
    } else if !snapshot.pagination.has_more {
        writeln!(out, "{END_OF_FEED}")
    } else {
        Ok(())
    }
}

/// The whole filtered list, for one-shot output.
pub fn render_feed(snapshot: &FeedSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_feed(&mut out, snapshot, 0..snapshot.articles.len());
    out
}

/// Saved preferences and the persisted facet lists, for `prefs show`.
pub fn render_preferences(saved: Option<&Preferences>, facets: &FacetCatalog) -> String {
    let criteria = FilterCriteria::from_preferences(saved);
    let mut filters = String::new();
    let _ = write_criteria(&mut filters, &criteria);

    let mut out = String::new();
    let summary = match saved {
        None => "No saved preferences.".to_string(),
        Some(_) if filters.is_empty() => "Saved preferences: no filters".to_string(),
        Some(_) => format!("Saved preferences: {}", filters.trim_start_matches("Filters: ").trim_end()),
    };
    out.push_str(&summary);
    out.push('\n');
    let _ = write_facets(&mut out, facets, &criteria);
    out
}

/// Interactive terminal view with a simulated scrolling viewport.
pub struct TerminalView<W> {
    out: W,
    viewport: f64,
    offset: f64,
    observer: SentinelObserver,
    was_fetching: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout(viewport: u32) -> Self {
        Self::new(io::stdout(), viewport)
    }
}

impl<W: io::Write> TerminalView<W> {
    pub fn new(out: W, viewport: u32) -> Self {
        Self {
            out,
            viewport: f64::from(viewport),
            offset: 0.0,
            observer: SentinelObserver::default(),
            was_fetching: false,
        }
    }

    /// Card indices intersecting the viewport.
    fn window(&self, len: usize) -> Range<usize> {
        let first = (self.offset / CARD_HEIGHT).floor() as usize;
        let last = ((self.offset + self.viewport) / CARD_HEIGHT).ceil() as usize;
        first.min(len)..last.min(len)
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: io::Write + Send> FeedView for TerminalView<W> {
    fn render(&mut self, snapshot: &FeedSnapshot) -> bool {
        // Re-observe whenever a fetch starts or ends.
        if snapshot.fetching != self.was_fetching {
            self.was_fetching = snapshot.fetching;
            self.observer.rearm();
        }

        let content_height = snapshot.articles.len() as f64 * CARD_HEIGHT;
        self.offset = self.offset.clamp(0.0, (content_height - self.viewport).max(0.0));

        let mut text = String::new();
        let _ = write_feed(&mut text, snapshot, self.window(snapshot.articles.len()));
        text.push_str("> ");
        self.emit(&text);

        let sentinel = snapshot.show_sentinel.then(|| Span::new(content_height, 1.0));
        self.observer.update(sentinel, Span::new(self.offset, self.viewport))
    }

    fn scroll(&mut self, delta: i32) {
        self.offset += f64::from(delta);
    }

    fn show_facets(&mut self, snapshot: &FeedSnapshot) {
        let mut text = String::new();
        let _ = write_facets(&mut text, &snapshot.facets, &snapshot.criteria);
        self.emit(&text);
    }
}
