//! JSON export of a feed snapshot.
//!
//! # Output Structure
//!
//! Files are grouped by UTC day, one file per export:
//! ```text
//! json_output_dir/
//! └── 2024-01-10/
//!     ├── 090000.json
//!     └── 173012.json
//! ```
//!
//! Each file holds the snapshot (status, criteria, pagination, facets and the
//! filtered articles) plus a `generatedAt` timestamp.

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::feed::FeedSnapshot;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    snapshot: &'a FeedSnapshot,
}

/// Write `snapshot` as JSON under `json_output_dir`.
///
/// # Arguments
///
/// * `snapshot` - The feed state to serialize
/// * `json_output_dir` - Base directory for JSON output
/// * `now` - Export time, which also picks the file name
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// `{json_output_dir}/{YYYY-MM-DD}/{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.as_ref().display()))]
pub async fn write_snapshot(
    snapshot: &FeedSnapshot,
    json_output_dir: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&Export {
        generated_at: now,
        snapshot,
    })?;

    let day_dir = json_output_dir.as_ref().join(now.format("%Y-%m-%d").to_string());
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(dir = %day_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = day_dir.join(format!("{}.json", now.format("%H%M%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = snapshot.articles.len(), "Wrote JSON snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::testing::{article, at};
    use crate::facets::FacetCatalog;
    use crate::feed::Feed;
    use crate::models::FilterCriteria;

    #[tokio::test]
    async fn test_write_snapshot_layout_and_fields() {
        let mut feed = Feed::new(FilterCriteria::default(), FacetCatalog::default());
        let ticket = feed.begin_fetch().unwrap();
        feed.complete_fetch(ticket, vec![article("https://g/1", "The Guardian", at(10, 9))]);

        let dir = tempfile::tempdir().unwrap();
        let now = at(10, 17);
        let path = write_snapshot(&feed.snapshot(), dir.path(), now).await.unwrap();
        assert_eq!(path, dir.path().join("2024-01-10").join("170000.json"));

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["generatedAt"], "2024-01-10T17:00:00Z");
        assert_eq!(written["status"], "ready");
        assert_eq!(written["pagination"]["page"], 2);
        assert_eq!(written["articles"][0]["url"], "https://g/1");
        assert_eq!(written["facets"]["sources"][0]["id"], "the-guardian");
        assert!(written.get("error").is_none());
    }
}
