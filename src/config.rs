//! Runtime configuration.
//!
//! Settings are layered: command-line flags and environment variables win
//! over the optional YAML file, which wins over built-in defaults.
//!
//! ```yaml
//! guardian_api_key: "..."
//! nyt_api_key: "..."
//! news_api_key: "..."
//! page_size: 10
//! state_dir: /var/lib/news_feed
//! # Base URLs only need setting when going through a proxy.
//! guardian_base_url: https://content.guardianapis.com
//! ```

use std::error::Error;
use std::path::PathBuf;

use serde::Deserialize;
use tokio::fs;
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::sources::{ProviderSettings, guardian, newsapi, nyt};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_STATE_DIR: &str = ".news_feed";

/// Contents of the optional YAML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub guardian_api_key: Option<String>,
    pub nyt_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub guardian_base_url: Option<String>,
    pub nyt_base_url: Option<String>,
    pub newsapi_base_url: Option<String>,
    pub page_size: Option<u32>,
    pub state_dir: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub guardian: ProviderSettings,
    pub nyt: ProviderSettings,
    pub newsapi: ProviderSettings,
    pub state_dir: PathBuf,
}

impl AppConfig {
    /// Read the config file named on the command line, if any, and merge.
    #[instrument(level = "info", skip_all)]
    pub async fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let file = match &cli.config {
            Some(path) => {
                let raw = fs::read_to_string(path).await?;
                let parsed: FileConfig = serde_yaml::from_str(&raw)?;
                info!(config_path = %path, "Loaded configuration");
                parsed
            }
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    /// Combine flags with file values. Flags take precedence.
    pub fn merge(cli: &Cli, file: FileConfig) -> Self {
        let page_size = cli.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let provider = |key: Option<&String>, file_key: Option<String>, base: Option<String>, default: &str| {
            ProviderSettings {
                api_key: key.cloned().or(file_key),
                base_url: base.unwrap_or_else(|| default.to_string()),
                page_size,
            }
        };
        Self {
            guardian: provider(
                cli.guardian_api_key.as_ref(),
                file.guardian_api_key,
                file.guardian_base_url,
                guardian::DEFAULT_BASE_URL,
            ),
            nyt: provider(
                cli.nyt_api_key.as_ref(),
                file.nyt_api_key,
                file.nyt_base_url,
                nyt::DEFAULT_BASE_URL,
            ),
            newsapi: provider(
                cli.news_api_key.as_ref(),
                file.news_api_key,
                file.newsapi_base_url,
                newsapi::DEFAULT_BASE_URL,
            ),
            state_dir: PathBuf::from(
                cli.state_dir
                    .clone()
                    .or(file.state_dir)
                    .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string()),
            ),
        }
    }
}
