//! Source adapters for the three news providers.
//!
//! Each adapter turns one provider's paginated search response into
//! [`Article`]s. Adapters follow the same three-step pattern:
//!
//! 1. **Query**: build provider parameters from the [`FeedQuery`] and a
//!    1-based page number (blank searches become a provider "latest" term)
//! 2. **Request**: one `GET` through the shared [`reqwest::Client`]
//! 3. **Parse**: one explicit `serde` parse function per provider that fails
//!    closed on shape mismatch
//!
//! # Supported Sources
//!
//! | Source | Module | Endpoint | Notes |
//! |--------|--------|----------|-------|
//! | The Guardian | [`guardian`] | Content API `/search` | Description cut from body text |
//! | New York Times | [`nyt`] | Article Search API | Zero-indexed pages, image picked from multimedia |
//! | NewsAPI | [`newsapi`] | `/v2/everything` | Source name comes from the payload |
//!
//! Failures never reach the caller of [`SourceAdapter::fetch`]: they are
//! logged and the adapter contributes an empty page.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AdapterError;
use crate::models::{Article, FeedQuery};
use crate::utils::{article_id, parse_published_at, truncate_for_log};

pub mod guardian;
pub mod newsapi;
pub mod nyt;

pub use guardian::GuardianAdapter;
pub use newsapi::NewsApiAdapter;
pub use nyt::NytAdapter;

/// Label used when a provider gives no category.
pub const DEFAULT_CATEGORY: &str = "General";

/// One external news provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &'static str;

    /// Request and parse one page. `page` is 1-based for every adapter.
    async fn try_fetch(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, AdapterError>;

    /// Like [`try_fetch`](Self::try_fetch), but any failure is logged and
    /// turned into an empty page.
    async fn fetch(&self, query: &FeedQuery, page: u32) -> Vec<Article> {
        match self.try_fetch(query, page).await {
            Ok(articles) => {
                debug!(source = self.name(), page, count = articles.len(), "Fetched page");
                articles
            }
            Err(e) => {
                warn!(source = self.name(), page, error = %e, "Fetch failed; contributing no articles");
                Vec::new()
            }
        }
    }
}

/// Connection settings for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: u32,
}

impl ProviderSettings {
    pub(crate) fn require_key(&self, provider: &'static str) -> Result<&str, AdapterError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdapterError::MissingApiKey(provider))
    }
}

/// Build the adapters in the fixed aggregation order: Guardian, NYT, NewsAPI.
pub fn default_adapters(config: &AppConfig, client: reqwest::Client) -> Vec<Arc<dyn SourceAdapter>> {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(GuardianAdapter::new(client.clone(), config.guardian.clone())),
        Arc::new(NytAdapter::new(client.clone(), config.nyt.clone())),
        Arc::new(NewsApiAdapter::new(client, config.newsapi.clone())),
    ];
    info!(
        sources = ?adapters.iter().map(|a| a.name()).collect::<Vec<_>>(),
        "Source adapters initialized"
    );
    adapters
}

/// Issue a `GET` and return the body of a 2xx response.
pub(crate) async fn get_body(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, AdapterError> {
    let response = client.get(url).query(params).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(source = provider, %status, body = %truncate_for_log(&body, 300), "Non-success response");
        return Err(AdapterError::Status { provider, status });
    }
    Ok(response.text().await?)
}

/// Parse a provider payload, mapping shape mismatches to [`AdapterError::Malformed`].
pub(crate) fn parse_payload<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    body: &str,
) -> Result<T, AdapterError> {
    serde_json::from_str(body).map_err(|source| {
        debug!(source = provider, body = %truncate_for_log(body, 300), "Payload did not match expected shape");
        AdapterError::Malformed { provider, source }
    })
}

/// Provider record after field mapping, before validation.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source: String,
    pub category: Option<String>,
    pub author: Option<String>,
    pub published_at: String,
}

impl Draft {
    /// Finish normalization. Records with an unparseable timestamp are dropped.
    pub fn into_article(self, provider: &'static str, default_category: &str) -> Option<Article> {
        let Some(published_at) = parse_published_at(&self.published_at) else {
            warn!(source = provider, url = %self.url, raw = %self.published_at, "Unparseable publication date; skipping article");
            return None;
        };
        let category = non_blank(self.category).unwrap_or_else(|| default_category.to_string());
        Some(Article {
            id: article_id(&self.url),
            title: self.title.trim().to_string(),
            description: self.description,
            url: self.url,
            image_url: non_blank(self.image_url),
            source: self.source,
            category,
            author: non_blank(self.author),
            published_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults_category_and_blanks() {
        let draft = Draft {
            title: " Title ".to_string(),
            url: "https://example.com/a".to_string(),
            source: "Example".to_string(),
            category: Some("  ".to_string()),
            author: Some("".to_string()),
            image_url: Some(" ".to_string()),
            published_at: "2024-01-10T10:00:00Z".to_string(),
            ..Draft::default()
        };
        let article = draft.into_article("test", DEFAULT_CATEGORY).unwrap();
        assert_eq!(article.title, "Title");
        assert_eq!(article.category, "General");
        assert_eq!(article.author, None);
        assert_eq!(article.image_url, None);
        assert_eq!(article.id, article_id("https://example.com/a"));
    }

    #[test]
    fn test_draft_with_bad_date_is_dropped() {
        let draft = Draft {
            url: "https://example.com/a".to_string(),
            published_at: "soon".to_string(),
            ..Draft::default()
        };
        assert!(draft.into_article("test", DEFAULT_CATEGORY).is_none());
    }

    #[test]
    fn test_require_key() {
        let mut settings = ProviderSettings {
            api_key: None,
            base_url: "https://example.com".to_string(),
            page_size: 10,
        };
        assert!(matches!(
            settings.require_key("test"),
            Err(AdapterError::MissingApiKey("test"))
        ));
        settings.api_key = Some("  ".to_string());
        assert!(settings.require_key("test").is_err());
        settings.api_key = Some("k".to_string());
        assert_eq!(settings.require_key("test").unwrap(), "k");
    }
}
