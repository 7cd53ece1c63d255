//! NewsAPI adapter.
//!
//! Uses the `/v2/everything` endpoint in English. NewsAPI reports errors in
//! a `200`-shaped envelope (`status: "error"`) as well as through HTTP
//! status codes; both end up as an [`AdapterError`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{Draft, ProviderSettings, SourceAdapter, DEFAULT_CATEGORY, get_body, parse_payload};
use crate::error::AdapterError;
use crate::models::{Article, FeedQuery};
use crate::utils::html_to_text;

pub const PROVIDER: &str = "newsapi";
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
/// Search term used when the user has not searched.
const LATEST: &str = "top-headlines";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    articles: Vec<Item>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    source: ItemSource,
    author: Option<String>,
    title: String,
    description: Option<String>,
    url: String,
    url_to_image: Option<String>,
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    name: String,
}

/// Parse an `/everything` payload.
pub fn parse_response(body: &str) -> Result<Vec<Article>, AdapterError> {
    let envelope: Envelope = parse_payload(PROVIDER, body)?;
    if envelope.status != "ok" {
        return Err(AdapterError::Rejected {
            provider: PROVIDER,
            message: envelope.message.unwrap_or(envelope.status),
        });
    }
    Ok(envelope
        .articles
        .into_iter()
        .filter_map(|item| {
            Draft {
                title: item.title,
                description: item.description.as_deref().map(html_to_text).unwrap_or_default(),
                url: item.url,
                image_url: item.url_to_image,
                source: item.source.name,
                category: None,
                author: item.author,
                published_at: item.published_at,
            }
            .into_article(PROVIDER, DEFAULT_CATEGORY)
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct NewsApiAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl NewsApiAdapter {
    pub fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn params(&self, api_key: &str, query: &FeedQuery, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apiKey", api_key.to_string()),
            ("q", query.search_term().unwrap_or(LATEST).to_string()),
            ("language", "en".to_string()),
            ("pageSize", self.settings.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(from) = query.date_from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = query.date_to {
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(level = "info", skip_all, fields(source = PROVIDER, page = page))]
    async fn try_fetch(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, AdapterError> {
        let api_key = self.settings.require_key(PROVIDER)?;
        let url = format!("{}/everything", self.settings.base_url.trim_end_matches('/'));
        let body = get_body(&self.client, PROVIDER, &url, &self.params(api_key, query, page)).await?;
        parse_response(&body)
    }
}
