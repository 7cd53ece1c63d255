//! The filter engine: which accumulated articles are shown.
//!
//! [`apply`] is pure and conjunctive over five checks: free-text search,
//! source, category, author and the date range. The order of the checks
//! does not matter.
//!
//! Date bounds are whole UTC days: `from` starts at 00:00:00.000 and `to`
//! ends at 23:59:59.999, both inclusive.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Article, FacetKind, FilterCriteria};

/// First instant of `day`.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(0, 0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Last millisecond of `day`.
pub fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc()
}

/// Articles from `articles` matching every active criterion, in input order.
pub fn apply(criteria: &FilterCriteria, articles: &[Article]) -> Vec<Article> {
    let search = criteria.search.to_lowercase();
    let from = criteria.date_from.map(day_start);
    let to = criteria.date_to.map(day_end);

    articles
        .iter()
        .filter(|a| search.is_empty() || a.searchable_text().contains(&search))
        .filter(|a| FacetKind::ALL.iter().all(|kind| facet_matches(criteria, a, *kind)))
        .filter(|a| from.is_none_or(|from| a.published_at >= from))
        .filter(|a| to.is_none_or(|to| a.published_at <= to))
        .cloned()
        .collect()
}

/// An empty selection matches everything. Otherwise the article's field,
/// slugified, must be selected; a missing author never matches.
fn facet_matches(criteria: &FilterCriteria, article: &Article, kind: FacetKind) -> bool {
    let selected = criteria.selected(kind);
    if selected.is_empty() {
        return true;
    }
    article
        .facet_slug(kind)
        .is_some_and(|slug| selected.contains(&slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::testing::{article, at};
    use chrono::TimeZone;

    fn sample() -> Vec<Article> {
        let mut guardian = article("https://g/1", "The Guardian", at(10, 9));
        guardian.title = "Climate talks stall".to_string();
        guardian.description = "Negotiators left without a deal".to_string();
        guardian.category = "World news".to_string();
        guardian.author = Some("Jane Doe".to_string());

        let mut nyt = article("https://nyt/1", "New York Times", at(9, 23));
        nyt.title = "Heat records".to_string();
        nyt.description = "A CLIMATE milestone".to_string();
        nyt.category = "U.S.".to_string();

        let mut bbc = article("https://bbc/1", "BBC News", at(11, 0));
        bbc.title = "Cup final preview".to_string();
        bbc.category = "Sport".to_string();
        bbc.author = Some("Alex Reporter".to_string());

        vec![guardian, nyt, bbc]
    }

    fn urls(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.url.as_str()).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let articles = sample();
        assert_eq!(apply(&FilterCriteria::default(), &articles), articles);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let criteria = FilterCriteria {
            search: "Climate".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(urls(&apply(&criteria, &sample())), vec!["https://g/1", "https://nyt/1"]);
    }

    #[test]
    fn test_source_and_category_match_by_slug() {
        let criteria = FilterCriteria {
            sources: vec!["the-guardian".to_string(), "bbc-news".to_string()],
            categories: vec!["world-news".to_string()],
            ..FilterCriteria::default()
        };
        assert_eq!(urls(&apply(&criteria, &sample())), vec!["https://g/1"]);
    }

    #[test]
    fn test_author_filter_excludes_articles_without_author() {
        let criteria = FilterCriteria {
            authors: vec!["jane-doe".to_string()],
            categories: vec!["u.s.".to_string(), "world-news".to_string()],
            ..FilterCriteria::default()
        };
        // The NYT story matches the category but has no author.
        assert_eq!(urls(&apply(&criteria, &sample())), vec!["https://g/1"]);
    }

    #[test]
    fn test_single_day_range_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut edge_start = article("https://e/start", "E", Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        edge_start.title = "start".to_string();
        let edge_end = article(
            "https://e/end",
            "E",
            Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 59).unwrap() + chrono::Duration::milliseconds(999),
        );
        let next_day = article("https://e/next", "E", Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap());
        let prev_day = article(
            "https://e/prev",
            "E",
            Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap(),
        );

        let criteria = FilterCriteria {
            date_from: Some(day),
            date_to: Some(day),
            ..FilterCriteria::default()
        };
        let filtered = apply(&criteria, &[edge_start, edge_end, next_day, prev_day]);
        assert_eq!(urls(&filtered), vec!["https://e/start", "https://e/end"]);
    }

    #[test]
    fn test_open_ended_ranges() {
        let criteria = FilterCriteria {
            date_from: NaiveDate::from_ymd_opt(2024, 1, 10),
            ..FilterCriteria::default()
        };
        assert_eq!(urls(&apply(&criteria, &sample())), vec!["https://g/1", "https://bbc/1"]);

        let criteria = FilterCriteria {
            date_to: NaiveDate::from_ymd_opt(2024, 1, 9),
            ..FilterCriteria::default()
        };
        assert_eq!(urls(&apply(&criteria, &sample())), vec!["https://nyt/1"]);
    }

    #[test]
    fn test_checks_are_conjunctive() {
        let criteria = FilterCriteria {
            search: "climate".to_string(),
            sources: vec!["bbc-news".to_string()],
            ..FilterCriteria::default()
        };
        assert!(apply(&criteria, &sample()).is_empty());
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(day_end(day) - day_start(day), chrono::Duration::milliseconds(86_399_999));
    }
}
