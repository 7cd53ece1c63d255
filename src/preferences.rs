//! Durable key-value state surviving restarts: saved preferences and the
//! facet lists derived from the first fetched page.
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `newsPreferences` | [`Preferences`] object |
//! | `availableSources` | array of [`FacetEntry`] |
//! | `availableCategories` | array of [`FacetEntry`] |
//! | `availableAuthors` | array of [`FacetEntry`] |
//!
//! Values are JSON. Malformed values are reported as
//! [`StoreError::Malformed`] rather than replaced by defaults.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::facets::FacetCatalog;
use crate::models::{FacetEntry, FacetKind, Preferences};

pub const PREFERENCES_KEY: &str = "newsPreferences";

/// String key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        fs::write(&path, value).await?;
        debug!(path = %path.display(), "Wrote state file");
        Ok(())
    }
}

/// In-process store.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: tokio::sync::RwLock<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to preferences and facet lists over a [`KeyValueStore`].
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &json).await
    }

    /// Saved preferences, or `None` if nothing was ever saved.
    #[instrument(level = "debug", skip_all)]
    pub async fn load(&self) -> Result<Option<Preferences>, StoreError> {
        self.read(PREFERENCES_KEY).await
    }

    #[instrument(level = "info", skip_all)]
    pub async fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        self.write(PREFERENCES_KEY, preferences).await?;
        info!(
            sources = preferences.sources.len(),
            categories = preferences.categories.len(),
            authors = preferences.authors.len(),
            "Saved preferences"
        );
        Ok(())
    }

    /// Persisted facet list for `kind`; empty if none was saved yet.
    pub async fn load_facets(&self, kind: FacetKind) -> Result<Vec<FacetEntry>, StoreError> {
        Ok(self.read(kind.storage_key()).await?.unwrap_or_default())
    }

    pub async fn load_catalog(&self) -> Result<FacetCatalog, StoreError> {
        Ok(FacetCatalog {
            sources: self.load_facets(FacetKind::Source).await?,
            categories: self.load_facets(FacetKind::Category).await?,
            authors: self.load_facets(FacetKind::Author).await?,
        })
    }

    #[instrument(level = "info", skip_all)]
    pub async fn save_catalog(&self, catalog: &FacetCatalog) -> Result<(), StoreError> {
        for kind in FacetKind::ALL {
            self.write(kind.storage_key(), catalog.entries(kind)).await?;
        }
        Ok(())
    }
}
