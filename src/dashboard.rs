//! Dashboard data export.
//!
//! Writes the reduced public JSON view consumed by the static dashboard
//! page: identity, aggregate metrics, a bounded slice of articles and
//! history, and a minimal latest-diff summary when the run detected new
//! citations. Pure projection; the one file write is the only side effect.

use crate::config::Config;
use crate::diff::CitationDiff;
use crate::error::Result;
use crate::snapshot::{Article, HistoryPoint, Snapshot};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Most articles exposed on the dashboard
const MAX_DASHBOARD_ARTICLES: usize = 50;

/// Most history points exposed on the dashboard
const MAX_DASHBOARD_HISTORY: usize = 90;

/// Public dashboard payload
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub name: String,
    pub affiliation: String,
    pub scholar_url: String,
    pub total_citations: u64,
    pub h_index: u64,
    pub i10_index: u64,
    pub last_checked: Option<String>,
    pub articles: Vec<Article>,
    pub history: Vec<HistoryPoint>,
    /// Present only when the last run gained citations; `null` otherwise
    pub latest_diff: Option<LatestDiff>,
}

/// Minimal summary of the run that produced this export
#[derive(Debug, Serialize)]
pub struct LatestDiff {
    pub gained: i64,
    pub articles_count: usize,
}

/// Writes the dashboard JSON file
pub struct DashboardExporter {
    path: PathBuf,
    scholar_url: String,
}

impl DashboardExporter {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.dashboard_file.clone(),
            scholar_url: config.scholar_url(),
        }
    }

    /// Project the snapshot plus diff into the public payload
    pub fn project(&self, snapshot: &Snapshot, diff: &CitationDiff) -> DashboardData {
        DashboardData {
            name: snapshot.name.clone(),
            affiliation: snapshot.affiliation.clone(),
            scholar_url: self.scholar_url.clone(),
            total_citations: snapshot.total_citations,
            h_index: snapshot.h_index,
            i10_index: snapshot.i10_index,
            last_checked: snapshot.last_checked.clone(),
            articles: snapshot
                .articles
                .iter()
                .take(MAX_DASHBOARD_ARTICLES)
                .cloned()
                .collect(),
            history: snapshot
                .history
                .iter()
                .rev()
                .take(MAX_DASHBOARD_HISTORY)
                .rev()
                .cloned()
                .collect(),
            latest_diff: diff.has_changes.then(|| LatestDiff {
                gained: diff.total_citations.gained,
                articles_count: diff.articles_with_new_citations.len(),
            }),
        }
    }

    /// Write the projection as pretty-printed JSON
    pub fn export(&self, snapshot: &Snapshot, diff: &CitationDiff) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let data = self.project(snapshot, diff);
        let content = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, content)?;

        info!(path = ?self.path, "Dashboard data written");
        Ok(())
    }
}
