//! Accumulated articles across all fetched pages.
//!
//! Every merge keeps the first occurrence of each identifier (in the order
//! pages and adapters delivered them) and re-sorts newest first. The sort is
//! stable, so articles published at the same instant keep delivery order.

use itertools::Itertools;

use crate::models::Article;

#[derive(Debug, Default, Clone)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fetched batch and restore the dedup and ordering invariants.
    ///
    /// Returns how many previously unseen articles the batch contributed.
    pub fn merge(&mut self, batch: Vec<Article>) -> usize {
        let before = self.articles.len();
        let mut merged: Vec<Article> = std::mem::take(&mut self.articles)
            .into_iter()
            .chain(batch)
            .unique_by(|a| a.id.clone())
            .collect();
        merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        self.articles = merged;
        self.articles.len() - before
    }

    pub fn clear(&mut self) {
        self.articles.clear();
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
