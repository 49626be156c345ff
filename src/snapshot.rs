//! Snapshot persistence for citation data.
//!
//! The snapshot is the last known view of the tracked profile: aggregate
//! metrics, the full article list, and a bounded history of daily readings.
//! It lives in one JSON file owned exclusively by [`SnapshotStore`];
//! read-modify-write, single runner, no locking.

use crate::error::Result;
use crate::serpapi::ProfileMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// History entries kept after each run (FIFO eviction beyond this)
pub const MAX_HISTORY: usize = 365;

/// One tracked article. Identity is the normalized title, not a stable
/// upstream id, so two distinct articles with identical titles collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub authors: String,
}

/// One aggregate reading, appended per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub total_citations: u64,
    #[serde(default)]
    pub h_index: u64,
    #[serde(default)]
    pub i10_index: u64,
}

/// Persisted view of the tracked profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub last_checked: Option<String>,
    #[serde(default)]
    pub total_citations: u64,
    #[serde(default)]
    pub h_index: u64,
    #[serde(default)]
    pub i10_index: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

impl Snapshot {
    /// Zero-value snapshot used when no prior file exists
    pub fn empty(author_id: &str, name: &str) -> Self {
        Self {
            author_id: author_id.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Build the successor snapshot for this run.
    ///
    /// Metrics and the article list are replaced wholesale with the fetched
    /// data (articles absent from the fetch are dropped; a lower total is
    /// accepted as the new baseline). History carries over with one new
    /// point appended and the oldest entries evicted past [`MAX_HISTORY`].
    pub fn advance(
        &self,
        metrics: &ProfileMetrics,
        articles: Vec<Article>,
        checked_at: String,
    ) -> Snapshot {
        let mut history = self.history.clone();
        history.push(HistoryPoint {
            date: checked_at.clone(),
            total_citations: metrics.total_citations,
            h_index: metrics.h_index,
            i10_index: metrics.i10_index,
        });
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }

        Snapshot {
            author_id: self.author_id.clone(),
            name: self.name.clone(),
            affiliation: metrics
                .affiliation
                .clone()
                .unwrap_or_else(|| crate::config::DEFAULT_AFFILIATION.to_string()),
            last_checked: Some(checked_at),
            total_citations: metrics.total_citations,
            h_index: metrics.h_index,
            i10_index: metrics.i10_index,
            articles,
            history,
        }
    }
}

/// Loads and persists the snapshot file
pub struct SnapshotStore {
    path: PathBuf,
    author_id: String,
    name: String,
}

impl SnapshotStore {
    pub fn new(path: PathBuf, author_id: &str, name: &str) -> Self {
        Self {
            path,
            author_id: author_id.to_string(),
            name: name.to_string(),
        }
    }

    /// Snapshot file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the previous snapshot, or the zero-value default when no file
    /// exists yet (first run).
    pub fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            info!(path = ?self.path, "No previous snapshot, starting fresh");
            return Ok(Snapshot::empty(&self.author_id, &self.name));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    /// Persist the snapshot as pretty-printed UTF-8 JSON.
    ///
    /// Writes to a temp sibling then renames, so a crash mid-write never
    /// leaves a truncated snapshot behind.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(path = ?self.path, "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metrics(total: u64, h: u64, i10: u64) -> ProfileMetrics {
        ProfileMetrics {
            total_citations: total,
            h_index: h,
            i10_index: i10,
            affiliation: Some("University of Waterloo".to_string()),
        }
    }

    fn article(title: &str, count: u64) -> Article {
        Article {
            title: title.to_string(),
            citation_count: count,
            ..Article::default()
        }
    }

    fn store(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(
            dir.path().join("data").join("citations.json"),
            "R_1o4RIAAAAJ",
            "Test Author",
        )
    }

    #[test]
    fn load_missing_file_returns_default() -> Result<()> {
        let dir = TempDir::new()?;
        let snapshot = store(&dir).load()?;
        assert_eq!(snapshot.author_id, "R_1o4RIAAAAJ");
        assert_eq!(snapshot.name, "Test Author");
        assert_eq!(snapshot.total_citations, 0);
        assert!(snapshot.last_checked.is_none());
        assert!(snapshot.articles.is_empty());
        assert!(snapshot.history.is_empty());
        Ok(())
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        let old = store.load()?;
        let snapshot = old.advance(
            &metrics(103, 9, 8),
            vec![article("A", 7), article("B", 1)],
            "2026-08-06T12:00:00+00:00".to_string(),
        );
        store.save(&snapshot)?;

        let loaded = store.load()?;
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.last_checked.as_deref(), Some("2026-08-06T12:00:00+00:00"));
        Ok(())
    }

    #[test]
    fn save_leaves_no_temp_file() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);
        store.save(&Snapshot::empty("id", "name"))?;

        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
        Ok(())
    }

    #[test]
    fn save_preserves_non_ascii() -> Result<()> {
        let dir = TempDir::new()?;
        let store = store(&dir);

        let mut snapshot = Snapshot::empty("id", "Negar Arabzadeh");
        snapshot.articles.push(article("Évaluation de systèmes de recherche", 3));
        store.save(&snapshot)?;

        let raw = std::fs::read_to_string(store.path())?;
        assert!(raw.contains("Évaluation de systèmes de recherche"));
        assert!(!raw.contains("\\u00c9"));
        Ok(())
    }

    #[test]
    fn history_capped_fifo() {
        let mut snapshot = Snapshot::empty("id", "name");
        snapshot.history = (0..MAX_HISTORY)
            .map(|i| HistoryPoint {
                date: format!("day-{}", i),
                total_citations: i as u64,
                ..HistoryPoint::default()
            })
            .collect();

        let next = snapshot.advance(&metrics(999, 1, 1), Vec::new(), "day-365".to_string());
        assert_eq!(next.history.len(), MAX_HISTORY);
        // oldest entry evicted, newest appended
        assert_eq!(next.history[0].date, "day-1");
        assert_eq!(next.history[MAX_HISTORY - 1].date, "day-365");
        assert_eq!(next.history[MAX_HISTORY - 1].total_citations, 999);
    }

    #[test]
    fn advance_replaces_articles_wholesale() {
        let mut snapshot = Snapshot::empty("id", "name");
        snapshot.articles = vec![article("Old Paper", 10), article("Gone Paper", 4)];

        let next = snapshot.advance(
            &metrics(20, 2, 1),
            vec![article("Old Paper", 12)],
            "t1".to_string(),
        );
        assert_eq!(next.articles, vec![article("Old Paper", 12)]);
    }

    #[test]
    fn advance_accepts_decreased_total() {
        let mut snapshot = Snapshot::empty("id", "name");
        snapshot.total_citations = 100;

        let next = snapshot.advance(&metrics(95, 5, 5), Vec::new(), "t1".to_string());
        assert_eq!(next.total_citations, 95);
    }

    #[test]
    fn advance_defaults_affiliation_when_absent() {
        let snapshot = Snapshot::empty("id", "name");
        let bare = ProfileMetrics {
            total_citations: 1,
            ..ProfileMetrics::default()
        };
        let next = snapshot.advance(&bare, Vec::new(), "t1".to_string());
        assert_eq!(next.affiliation, crate::config::DEFAULT_AFFILIATION);
    }

    #[test]
    fn load_tolerates_missing_fields() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("citations.json");
        std::fs::write(&path, r#"{"total_citations": 42, "articles": [{"title": "A"}]}"#)?;

        let store = SnapshotStore::new(path, "id", "name");
        let snapshot = store.load()?;
        assert_eq!(snapshot.total_citations, 42);
        assert_eq!(snapshot.articles[0].citation_count, 0);
        assert!(snapshot.history.is_empty());
        Ok(())
    }
}
