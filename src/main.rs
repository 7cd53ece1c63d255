//! # News Feed
//!
//! A terminal news reader that merges articles from three providers into one
//! deduplicated, newest-first, infinitely scrolling feed with local filters
//! and saved preferences.
//!
//! ## Features
//!
//! - Fetches the Guardian Content API, the New York Times Article Search API
//!   and NewsAPI concurrently, one page at a time
//! - Deduplicates by canonical URL and keeps the feed sorted by publication time
//! - Filters by free text, source, category, author and an inclusive date range
//! - Derives filter values from the first page and remembers them, together
//!   with saved source, category and author selections, in a state directory
//! - Loads the next page when the end of the list scrolls into view
//!
//! ## Usage
//!
//! ```sh
//! news_feed browse
//! news_feed fetch --search climate --pages 2
//! news_feed prefs set --source the-guardian
//! ```
//!
//! ## Architecture
//!
//! 1. **Sources**: one adapter per provider normalizes responses to [`models::Article`]
//! 2. **Aggregation**: every adapter is asked for the same page at once
//! 3. **Feed**: a single-flight cursor merges pages into the article store
//! 4. **Filtering**: the visible list is recomputed from the store on every change
//! 5. **Session**: an event loop ties input, fetches and rendering together

use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod error;
mod facets;
mod feed;
mod filter;
mod models;
mod outputs;
mod preferences;
mod repl;
mod session;
mod sources;
mod store;
mod utils;
mod visibility;

use aggregator::Aggregator;
use cli::{Cli, Command, FetchArgs, PrefsCommand};
use config::AppConfig;
use feed::{Feed, FetchCompletion};
use models::FilterCriteria;
use outputs::{json, text};
use preferences::{FileStore, PreferenceStore};
use repl::{HELP, ReplCommand, parse_command};
use session::{FeedEvent, Session, SessionExit};

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_feed starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, state_dir = ?args.state_dir, "Parsed CLI arguments");

    let config = AppConfig::load(&args).await?;
    info!(state_dir = %config.state_dir.display(), "Using state directory");
    let preferences = PreferenceStore::new(Arc::new(FileStore::new(&config.state_dir)));

    match args.command {
        Command::Browse { viewport } => browse(&config, preferences, viewport).await?,
        Command::Fetch(fetch_args) => fetch(&config, preferences, fetch_args).await?,
        Command::Prefs { command } => prefs(preferences, command).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn build_aggregator(config: &AppConfig) -> Result<Aggregator, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()?;
    Ok(Aggregator::new(sources::default_adapters(config, client)))
}

/// Interactive session. Saving preferences restarts it from the saved state.
#[instrument(level = "info", skip_all, fields(viewport = viewport))]
async fn browse(config: &AppConfig, preferences: PreferenceStore, viewport: u32) -> Result<(), Box<dyn Error>> {
    let aggregator = build_aggregator(config)?;
    let (events_tx, mut events) = mpsc::channel(32);
    spawn_input_reader(events_tx);

    print!("{HELP}");
    let mut view = text::TerminalView::stdout(viewport);
    loop {
        let mut session = Session::start(aggregator.clone(), preferences.clone(), view).await?;
        let exit = session.run(&mut events).await?;
        view = session.into_view();
        match exit {
            SessionExit::Quit => break,
            SessionExit::Reload => info!("Reloading with saved preferences"),
        }
    }
    Ok(())
}

/// Read commands from stdin on a plain thread, so a pending read never
/// holds up runtime shutdown.
fn spawn_input_reader(events: mpsc::Sender<FeedEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            };
            let event = match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(ReplCommand::Help)) => {
                    print!("{HELP}");
                    continue;
                }
                Ok(Some(ReplCommand::Event(event))) => event,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };
            if events.blocking_send(event).is_err() {
                return;
            }
        }
    });
}

/// Fetch a number of pages through the cursor and print or export the result.
#[instrument(level = "info", skip_all, fields(pages = args.pages, search = %args.search))]
async fn fetch(config: &AppConfig, preferences: PreferenceStore, args: FetchArgs) -> Result<(), Box<dyn Error>> {
    let aggregator = build_aggregator(config)?;

    let saved = preferences.load().await?;
    let mut criteria = FilterCriteria::from_preferences(saved.as_ref());
    criteria.search = args.search.clone();
    criteria.date_from = args.from;
    criteria.date_to = args.to;
    args.facets.apply_to(&mut criteria);

    let mut feed = Feed::new(criteria, preferences.load_catalog().await?);
    for _ in 0..args.pages.max(1) {
        let Some(ticket) = feed.begin_fetch() else {
            break;
        };
        let articles = aggregator.fetch_page(&ticket.query, ticket.page).await;
        if let FetchCompletion::Merged {
            facets: Some(catalog), ..
        } = feed.complete_fetch(ticket, articles)
        {
            if let Err(e) = preferences.save_catalog(&catalog).await {
                warn!(error = %e, "Failed to persist facet lists");
            }
        }
    }

    let snapshot = feed.snapshot();
    match args.json.as_deref() {
        Some(dir) => {
            let path = json::write_snapshot(&snapshot, dir, Utc::now()).await?;
            println!("{}", path.display());
        }
        None => print!("{}", text::render_feed(&snapshot)),
    }
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn prefs(preferences: PreferenceStore, command: PrefsCommand) -> Result<(), Box<dyn Error>> {
    match command {
        PrefsCommand::Show => {
            let saved = preferences.load().await?;
            let facets = preferences.load_catalog().await?;
            print!("{}", text::render_preferences(saved.as_ref(), &facets));
        }
        PrefsCommand::Set(facets) => {
            if facets.is_empty() {
                warn!("No filters given; saved preferences will be cleared");
            }
            let saved = facets.to_preferences();
            preferences.save(&saved).await?;
            print!("{}", text::render_preferences(Some(&saved), &preferences.load_catalog().await?));
        }
    }
    Ok(())
}
