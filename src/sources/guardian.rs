//! The Guardian Content API adapter.
//!
//! Queries `/search` ordered by newest with the headline, thumbnail, byline
//! and body text fields. The API returns full body text rather than a
//! summary, so the description is an excerpt of it.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{Draft, ProviderSettings, SourceAdapter, DEFAULT_CATEGORY, get_body, parse_payload};
use crate::error::AdapterError;
use crate::models::{Article, FeedQuery};
use crate::utils::excerpt;

pub const PROVIDER: &str = "guardian";
pub const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com";
const SOURCE_NAME: &str = "The Guardian";
/// Search term used when the user has not searched.
const LATEST: &str = "latest";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    web_title: String,
    web_url: String,
    web_publication_date: String,
    pillar_name: Option<String>,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    thumbnail: Option<String>,
    byline: Option<String>,
    #[serde(default)]
    body_text: String,
}

/// Parse a Guardian search payload.
pub fn parse_response(body: &str) -> Result<Vec<Article>, AdapterError> {
    let envelope: Envelope = parse_payload(PROVIDER, body)?;
    Ok(envelope
        .response
        .results
        .into_iter()
        .filter_map(|r| {
            let body = r.fields.body_text.trim();
            Draft {
                title: r.web_title,
                description: if body.is_empty() { String::new() } else { excerpt(body) },
                url: r.web_url,
                image_url: r.fields.thumbnail,
                source: SOURCE_NAME.to_string(),
                category: r.pillar_name,
                author: r.fields.byline,
                published_at: r.web_publication_date,
            }
            .into_article(PROVIDER, DEFAULT_CATEGORY)
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct GuardianAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl GuardianAdapter {
    pub fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn params(&self, api_key: &str, query: &FeedQuery, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api-key", api_key.to_string()),
            ("q", query.search_term().unwrap_or(LATEST).to_string()),
            ("order-by", "newest".to_string()),
            ("show-fields", "headline,thumbnail,byline,bodyText".to_string()),
            ("page-size", self.settings.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(from) = query.date_from {
            params.push(("from-date", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = query.date_to {
            params.push(("to-date", to.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

#[async_trait]
impl SourceAdapter for GuardianAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(level = "info", skip_all, fields(source = PROVIDER, page = page))]
    async fn try_fetch(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, AdapterError> {
        let api_key = self.settings.require_key(PROVIDER)?;
        let url = format!("{}/search", self.settings.base_url.trim_end_matches('/'));
        let body = get_body(&self.client, PROVIDER, &url, &self.params(api_key, query, page)).await?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAYLOAD: &str = r#"{
        "response": {
            "status": "ok",
            "results": [
                {
                    "webTitle": "Climate talks stall",
                    "webUrl": "https://www.theguardian.com/environment/2024/jan/10/climate-talks",
                    "webPublicationDate": "2024-01-10T09:15:00Z",
                    "pillarName": "News",
                    "fields": {
                        "thumbnail": "https://media.guim.co.uk/thumb.jpg",
                        "byline": "Jane Doe",
                        "bodyText": "Negotiators left the summit without agreement."
                    }
                },
                {
                    "webTitle": "Untitled pillar",
                    "webUrl": "https://www.theguardian.com/x",
                    "webPublicationDate": "2024-01-09T09:15:00Z"
                }
            ]
        }
    }"#;

    fn adapter() -> GuardianAdapter {
        GuardianAdapter::new(
            reqwest::Client::new(),
            ProviderSettings {
                api_key: Some("key".to_string()),
                base_url: DEFAULT_BASE_URL.to_string(),
                page_size: 10,
            },
        )
    }

    #[test]
    fn test_parse_response() {
        let articles = parse_response(PAYLOAD).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Climate talks stall");
        assert_eq!(first.source, "The Guardian");
        assert_eq!(first.category, "News");
        assert_eq!(first.author.as_deref(), Some("Jane Doe"));
        assert_eq!(first.description, "Negotiators left the summit without agreement....");
        assert_eq!(first.image_url.as_deref(), Some("https://media.guim.co.uk/thumb.jpg"));

        let second = &articles[1];
        assert_eq!(second.category, "General");
        assert_eq!(second.author, None);
        // No body text: no excerpt, not a bare ellipsis.
        assert!(second.description.is_empty());
    }

    #[test]
    fn test_parse_response_fails_closed() {
        assert!(matches!(
            parse_response(r#"{"message": "Unauthorized"}"#),
            Err(AdapterError::Malformed { provider: "guardian", .. })
        ));
    }

    #[test]
    fn test_blank_search_uses_latest() {
        let params = adapter().params("key", &FeedQuery::default(), 1);
        assert!(params.contains(&("q", "latest".to_string())));
        assert!(params.contains(&("page", "1".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "from-date"));
    }

    #[test]
    fn test_date_bounds_are_sent() {
        let query = FeedQuery {
            search: "climate".to_string(),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 10),
            date_to: NaiveDate::from_ymd_opt(2024, 1, 11),
        };
        let params = adapter().params("key", &query, 3);
        assert!(params.contains(&("q", "climate".to_string())));
        assert!(params.contains(&("from-date", "2024-01-10".to_string())));
        assert!(params.contains(&("to-date", "2024-01-11".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty_page() {
        let adapter = GuardianAdapter::new(
            reqwest::Client::new(),
            ProviderSettings {
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                page_size: 10,
            },
        );
        assert!(adapter.fetch(&FeedQuery::default(), 1).await.is_empty());
    }
}
