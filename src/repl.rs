//! Line commands for the interactive `browse` session.
//!
//! Each line maps onto one [`FeedEvent`], except `help`, which the reader
//! answers itself. Commands touching both date bounds send a single
//! [`FeedEvent::DateRange`], so providers are queried once.

use chrono::NaiveDate;

use crate::models::FacetKind;
use crate::outputs::text::CARD_HEIGHT;
use crate::session::FeedEvent;
use crate::utils::slugify;

pub const HELP: &str = "\
Commands:
  more                     load the next page
  scroll <n>               scroll by n cards (negative scrolls up)
  search <text>            filter by text; providers are queried after a pause
  from <YYYY-MM-DD>        earliest publication day (no date clears it)
  to <YYYY-MM-DD>          latest publication day (no date clears it)
  dates <from> <to>        set both days at once
  source <name|slug>       toggle a source filter
  category <name|slug>     toggle a category filter
  author <name|slug>       toggle an author filter
  clear <field>            clear search, dates, sources, categories or authors
  facets                   list the available filter values
  save                     save source, category and author filters, then reload
  help                     show this help
  quit                     leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Event(FeedEvent),
    Help,
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let event = match verb.to_lowercase().as_str() {
        "more" | "m" => FeedEvent::LoadMore,
        "scroll" | "s" => {
            let cards: i32 = rest
                .parse()
                .map_err(|_| format!("scroll expects a number of cards, got `{rest}`"))?;
            FeedEvent::Scroll(cards.saturating_mul(CARD_HEIGHT as i32))
        }
        "search" | "/" => FeedEvent::Search(rest.to_string()),
        "from" => FeedEvent::DateFrom(parse_day(rest)?),
        "to" => FeedEvent::DateTo(parse_day(rest)?),
        "dates" => {
            let mut days = rest.split_whitespace();
            let (Some(from), Some(to), None) = (days.next(), days.next(), days.next()) else {
                return Err("dates expects two days, e.g. `dates 2024-01-01 2024-01-10`".to_string());
            };
            FeedEvent::DateRange(parse_day(from)?, parse_day(to)?)
        }
        "source" | "category" | "author" => {
            if rest.is_empty() {
                return Err(format!("{verb} expects a name or slug"));
            }
            let kind: FacetKind = verb.parse()?;
            FeedEvent::Toggle(kind, slugify(rest))
        }
        "clear" => parse_clear(rest)?,
        "facets" | "f" => FeedEvent::ShowFacets,
        "save" => FeedEvent::SavePreferences,
        "help" | "h" | "?" => return Ok(Some(ReplCommand::Help)),
        "quit" | "exit" | "q" => FeedEvent::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(ReplCommand::Event(event)))
}

fn parse_day(raw: &str) -> Result<Option<NaiveDate>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("expected a date like 2024-01-10, got `{raw}`"))
}

fn parse_clear(field: &str) -> Result<FeedEvent, String> {
    Ok(match field {
        "search" => FeedEvent::Search(String::new()),
        "from" => FeedEvent::DateFrom(None),
        "to" => FeedEvent::DateTo(None),
        "dates" | "date" => FeedEvent::DateRange(None, None),
        other => FeedEvent::Clear(other.parse()?),
    })
}
