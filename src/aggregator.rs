//! Fan-out of one page request to every source adapter.
//!
//! All adapter calls for a page are issued at once and joined; none is
//! short-circuited by another's failure. Results are concatenated in adapter
//! order, so for the default set the Guardian's articles come first, then the
//! NYT's, then NewsAPI's. Deduplication and ordering happen later, in the
//! article store.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::models::{Article, FeedQuery};
use crate::sources::SourceAdapter;

#[derive(Clone)]
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("adapters", &self.adapters.iter().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Fetch `page` (1-based) from every adapter and concatenate the results.
    ///
    /// Never fails. When every adapter fails the result is empty, which the
    /// feed reads as "no more pages".
    #[instrument(level = "info", skip_all, fields(page = page, search = %query.search))]
    pub async fn fetch_page(&self, query: &FeedQuery, page: u32) -> Vec<Article> {
        let pages = join_all(self.adapters.iter().map(|a| a.fetch(query, page))).await;

        let counts: Vec<(&'static str, usize)> = self
            .adapters
            .iter()
            .zip(&pages)
            .map(|(a, p)| (a.name(), p.len()))
            .collect();
        let merged: Vec<Article> = pages.into_iter().flatten().collect();
        info!(total = merged.len(), per_source = ?counts, "Aggregated page");
        merged
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable adapters shared by the aggregator, feed and session tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::error::AdapterError;
    use crate::models::{Article, FeedQuery};
    use crate::sources::SourceAdapter;
    use crate::utils::article_id;

    pub fn article(url: &str, source: &str, published_at: DateTime<Utc>) -> Article {
        Article {
            id: article_id(url),
            title: format!("Story at {url}"),
            description: String::new(),
            url: url.to_string(),
            image_url: None,
            source: source.to_string(),
            category: "General".to_string(),
            author: None,
            published_at,
        }
    }

    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    /// An adapter serving canned pages, recording every request.
    ///
    /// Pages registered with [`FakeAdapter::with_search`] answer only that
    /// search term; the rest answer any query.
    pub struct FakeAdapter {
        pub name: &'static str,
        pub pages: HashMap<u32, Vec<Article>>,
        pub searches: HashMap<(String, u32), Vec<Article>>,
        pub fail: bool,
        pub panics: bool,
        pub delay: Option<Duration>,
        pub calls: Mutex<Vec<(FeedQuery, u32)>>,
    }

    impl FakeAdapter {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                pages: HashMap::new(),
                searches: HashMap::new(),
                fail: false,
                panics: false,
                delay: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_page(mut self, page: u32, articles: Vec<Article>) -> Self {
            self.pages.insert(page, articles);
            self
        }

        pub fn with_search(mut self, search: &str, page: u32, articles: Vec<Article>) -> Self {
            self.searches.insert((search.to_string(), page), articles);
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        pub fn panicking(mut self) -> Self {
            self.panics = true;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<(FeedQuery, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceAdapter for FakeAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn try_fetch(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, AdapterError> {
            self.calls.lock().unwrap().push((query.clone(), page));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panics {
                panic!("{} adapter blew up", self.name);
            }
            if self.fail {
                return Err(AdapterError::MissingApiKey(self.name));
            }
            let by_search = self.searches.get(&(query.search.clone(), page));
            Ok(by_search.or(self.pages.get(&page)).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeAdapter, article, at};
    use super::*;

    #[tokio::test]
    async fn test_concatenates_in_adapter_order() {
        let guardian = FakeAdapter::new("guardian").with_page(
            1,
            vec![
                article("https://g/1", "The Guardian", at(1, 1)),
                article("https://g/2", "The Guardian", at(1, 2)),
            ],
        );
        let nyt = FakeAdapter::new("nyt");
        let newsapi = FakeAdapter::new("newsapi").with_page(1, vec![article("https://n/1", "BBC News", at(2, 1))]);

        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(guardian), Arc::new(nyt), Arc::new(newsapi)];
        let aggregator = Aggregator::new(adapters);
        let articles = aggregator.fetch_page(&FeedQuery::default(), 1).await;

        let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://g/1", "https://g/2", "https://n/1"]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_short_circuit() {
        let ok = Arc::new(FakeAdapter::new("ok").with_page(3, vec![article("https://a/1", "A", at(1, 1))]));
        let broken = Arc::new(FakeAdapter::new("broken").failing());
        let late = Arc::new(
            FakeAdapter::new("late")
                .with_delay(std::time::Duration::from_millis(20))
                .with_page(3, vec![article("https://b/1", "B", at(1, 2))]),
        );

        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![broken.clone(), ok.clone(), late.clone()];
        let aggregator = Aggregator::new(adapters);
        let articles = aggregator.fetch_page(&FeedQuery::default(), 3).await;

        assert_eq!(articles.len(), 2);
        assert_eq!(broken.calls().len(), 1);
        assert_eq!(late.calls()[0].1, 3);
    }

    #[tokio::test]
    async fn test_all_failing_yields_empty() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(FakeAdapter::new("a").failing()),
            Arc::new(FakeAdapter::new("b").failing()),
        ];
        let aggregator = Aggregator::new(adapters);
        assert!(aggregator.fetch_page(&FeedQuery::default(), 1).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_adapters_are_asked_concurrently() {
        let delay = std::time::Duration::from_secs(1);
        let adapters: Vec<Arc<dyn SourceAdapter>> = ["guardian", "nyt", "newsapi"]
            .into_iter()
            .map(|name| -> Arc<dyn SourceAdapter> {
                Arc::new(
                    FakeAdapter::new(name)
                        .with_delay(delay)
                        .with_page(1, vec![article(&format!("https://{name}/1"), name, at(1, 1))]),
                )
            })
            .collect();
        let aggregator = Aggregator::new(adapters);

        let started = tokio::time::Instant::now();
        let articles = aggregator.fetch_page(&FeedQuery::default(), 1).await;

        assert_eq!(articles.len(), 3);
        assert_eq!(started.elapsed(), delay);
    }
}
