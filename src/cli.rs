//! Command-line interface definitions for News Feed.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Provider keys and the state directory can be provided via command-line
//! flags, environment variables or the optional YAML config file.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;

use crate::models::{FacetKind, FilterCriteria, Preferences};
use crate::utils::slugify;

/// Command-line arguments for the News Feed application.
///
/// # Examples
///
/// ```sh
/// # Interactive, infinitely scrolling feed
/// news_feed browse
///
/// # Two pages about climate from one day, as JSON
/// news_feed fetch --search climate --from 2024-01-10 --to 2024-01-10 --pages 2 --json ./out
///
/// # Save preferred sources; the next session starts filtered
/// news_feed prefs set --source the-guardian
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// The Guardian Content API key
    #[arg(long, env = "GUARDIAN_API_KEY", global = true, hide_env_values = true)]
    pub guardian_api_key: Option<String>,

    /// New York Times API key
    #[arg(long, env = "NYT_API_KEY", global = true, hide_env_values = true)]
    pub nyt_api_key: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", global = true, hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Directory holding saved preferences and facet lists
    #[arg(long, env = "NEWS_FEED_STATE_DIR", global = true)]
    pub state_dir: Option<String>,

    /// Articles requested from each provider per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse the merged feed interactively
    Browse {
        /// Height of the simulated viewport in pixels
        #[arg(long, default_value_t = 600)]
        viewport: u32,
    },
    /// Fetch pages once and print the filtered result
    Fetch(FetchArgs),
    /// Show or save personalization preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// Free-text search
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Earliest publication day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest publication day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Number of pages to fetch before printing
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,

    #[command(flatten)]
    pub facets: FacetArgs,

    /// Write the result as JSON into this directory instead of printing it
    #[arg(short, long)]
    pub json: Option<String>,
}

/// Facet selections given as slugs, e.g. `--source the-guardian`.
#[derive(Args, Debug, Default, Clone)]
pub struct FacetArgs {
    #[arg(long = "source")]
    pub sources: Vec<String>,

    #[arg(long = "category")]
    pub categories: Vec<String>,

    #[arg(long = "author")]
    pub authors: Vec<String>,
}

impl FacetArgs {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.categories.is_empty() && self.authors.is_empty()
    }

    /// Slugified, deduplicated values given for `kind`.
    pub fn slugs(&self, kind: FacetKind) -> Vec<String> {
        let values = match kind {
            FacetKind::Source => &self.sources,
            FacetKind::Category => &self.categories,
            FacetKind::Author => &self.authors,
        };
        values.iter().map(|v| slugify(v)).unique().collect()
    }

    /// Replace the selection of every facet given on the command line.
    /// Facets without flags keep their current selection.
    pub fn apply_to(&self, criteria: &mut FilterCriteria) {
        for kind in FacetKind::ALL {
            let slugs = self.slugs(kind);
            if slugs.is_empty() {
                continue;
            }
            criteria.clear_facet(kind);
            for slug in &slugs {
                criteria.toggle(kind, slug);
            }
        }
    }

    pub fn to_preferences(&self) -> Preferences {
        Preferences {
            sources: self.slugs(FacetKind::Source),
            categories: self.slugs(FacetKind::Category),
            authors: self.slugs(FacetKind::Author),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print saved preferences and the known facet values
    Show,
    /// Replace saved preferences
    Set(FacetArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_browse() {
        let cli = Cli::parse_from(["news_feed", "browse"]);
        assert!(matches!(cli.command, Command::Browse { viewport: 600 }));
    }

    #[test]
    fn test_cli_parsing_fetch() {
        let cli = Cli::parse_from([
            "news_feed",
            "fetch",
            "--search",
            "climate",
            "--from",
            "2024-01-10",
            "--to",
            "2024-01-10",
            "--source",
            "the-guardian",
            "--source",
            "bbc-news",
            "-p",
            "3",
        ]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.search, "climate");
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(args.facets.sources, vec!["the-guardian", "bbc-news"]);
        assert_eq!(args.pages, 3);
        assert!(args.json.is_none());
    }

    #[test]
    fn test_facet_flags_override_only_given_facets() {
        let flags = FacetArgs {
            sources: vec!["The Guardian".to_string(), "the-guardian".to_string()],
            ..FacetArgs::default()
        };
        let mut criteria = FilterCriteria {
            sources: vec!["bbc-news".to_string()],
            authors: vec!["jane-doe".to_string()],
            ..FilterCriteria::default()
        };
        flags.apply_to(&mut criteria);
        assert_eq!(criteria.sources, vec!["the-guardian"]);
        assert_eq!(criteria.authors, vec!["jane-doe"]);
        assert_eq!(flags.to_preferences().sources, vec!["the-guardian"]);
        assert!(flags.to_preferences().authors.is_empty());
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["news_feed", "fetch", "--from", "10/01/2024"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "news_feed",
            "prefs",
            "set",
            "--author",
            "jane-doe",
            "--state-dir",
            "/tmp/state",
        ]);
        assert_eq!(cli.state_dir.as_deref(), Some("/tmp/state"));
        let Command::Prefs {
            command: PrefsCommand::Set(facets),
        } = cli.command
        else {
            panic!("expected prefs set");
        };
        assert_eq!(facets.authors, vec!["jane-doe"]);
    }
}
