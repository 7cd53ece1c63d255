//! New York Times Article Search API adapter.
//!
//! The Article Search API numbers pages from zero, so the 1-based page the
//! aggregator passes in is shifted down by one here. Images come from the
//! `multimedia` list: the first entry of type `image` wins, with a fixed
//! placeholder when there is none.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::{Draft, ProviderSettings, SourceAdapter, get_body, parse_payload};
use crate::error::AdapterError;
use crate::models::{Article, FeedQuery};

pub const PROVIDER: &str = "nyt";
pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com/svc/search/v2";
const SOURCE_NAME: &str = "New York Times";
const DEFAULT_SECTION: &str = "U.S.";
const IMAGE_HOST: &str = "https://www.nytimes.com/";
const PLACEHOLDER_IMAGE: &str = "images/2014/07/16/arts/jpcomedy1/jpcomedy1-thumbWide.jpg";
const FIELD_LIST: &str = "headline,abstract,web_url,pub_date,multimedia,section_name,byline";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    headline: Headline,
    #[serde(rename = "abstract", default)]
    summary: String,
    web_url: String,
    pub_date: String,
    /// An array of media objects in the classic schema; left untyped so
    /// other shapes degrade to the placeholder image.
    #[serde(default)]
    multimedia: Value,
    section_name: Option<String>,
    byline: Option<Byline>,
}

#[derive(Debug, Deserialize)]
struct Headline {
    main: String,
}

#[derive(Debug, Deserialize)]
struct Byline {
    original: Option<String>,
}

/// Pick the representative image URL from a multimedia list.
fn image_url(multimedia: &Value) -> String {
    let path = multimedia
        .as_array()
        .into_iter()
        .flatten()
        .find(|m| m.get("type").and_then(Value::as_str) == Some("image"))
        .and_then(|m| m.get("url").and_then(Value::as_str))
        .unwrap_or(PLACEHOLDER_IMAGE);
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{IMAGE_HOST}{}", path.trim_start_matches('/'))
    }
}

fn author(byline: Option<Byline>) -> Option<String> {
    byline
        .and_then(|b| b.original)
        .map(|original| original.strip_prefix("By ").unwrap_or(&original).to_string())
}

/// Parse an Article Search payload.
pub fn parse_response(body: &str) -> Result<Vec<Article>, AdapterError> {
    let envelope: Envelope = parse_payload(PROVIDER, body)?;
    Ok(envelope
        .response
        .docs
        .into_iter()
        .filter_map(|doc| {
            Draft {
                title: doc.headline.main,
                description: doc.summary,
                image_url: Some(image_url(&doc.multimedia)),
                url: doc.web_url,
                source: SOURCE_NAME.to_string(),
                category: doc.section_name,
                author: author(doc.byline),
                published_at: doc.pub_date,
            }
            .into_article(PROVIDER, DEFAULT_SECTION)
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct NytAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl NytAdapter {
    pub fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn params(&self, api_key: &str, query: &FeedQuery, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api-key", api_key.to_string()),
            ("page", page.saturating_sub(1).to_string()),
            ("fl", FIELD_LIST.to_string()),
        ];
        match query.search_term() {
            Some(term) => params.push(("q", term.to_string())),
            // No term means "latest": newest first across everything.
            None => params.push(("sort", "newest".to_string())),
        }
        if let Some(from) = query.date_from {
            params.push(("begin_date", from.format("%Y%m%d").to_string()));
        }
        if let Some(to) = query.date_to {
            params.push(("end_date", to.format("%Y%m%d").to_string()));
        }
        params
    }
}

#[async_trait]
impl SourceAdapter for NytAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(level = "info", skip_all, fields(source = PROVIDER, page = page))]
    async fn try_fetch(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, AdapterError> {
        let api_key = self.settings.require_key(PROVIDER)?;
        let url = format!("{}/articlesearch.json", self.settings.base_url.trim_end_matches('/'));
        let body = get_body(&self.client, PROVIDER, &url, &self.params(api_key, query, page)).await?;
        parse_response(&body)
    }
}
