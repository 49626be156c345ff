//! Snapshot comparison engine.
//!
//! Compares the previous snapshot against freshly fetched data and reports:
//! - aggregate deltas for total citations, h-index, and i10-index
//! - per-article deltas for every article whose count strictly increased
//!
//! Articles are matched across snapshots by normalized title (trim +
//! lowercase) — there is no stable upstream identifier, so two distinct
//! articles with identical titles collide. `has_changes` follows the
//! aggregate total only; the per-article list is an independent signal and
//! may be empty even when the aggregate moved (a new article arriving with
//! citations, or title drift). Both signals are preserved as-is.
//!
//! The diff is ephemeral: computed fresh each run, never persisted.

use crate::serpapi::ProfileMetrics;
use crate::snapshot::{Article, Snapshot};
use std::collections::HashMap;

/// Old/new/gained for the aggregate citation total. `gained` is signed: a
/// retraction can lower the total, which is accepted as a new baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalDelta {
    pub old: u64,
    pub new: u64,
    pub gained: i64,
}

/// Old/new pair for an index metric reported by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDelta {
    pub old: u64,
    pub new: u64,
}

/// One article whose citation count increased since the last snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDelta {
    pub title: String,
    pub old_count: u64,
    pub new_count: u64,
    pub gained: u64,
    pub year: String,
}

/// Result of comparing two snapshots. Unsorted: display ordering is the
/// consumer's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationDiff {
    pub total_citations: TotalDelta,
    pub h_index: IndexDelta,
    pub i10_index: IndexDelta,
    pub articles_with_new_citations: Vec<ArticleDelta>,
    /// True iff the aggregate total strictly increased. Gates notification.
    pub has_changes: bool,
}

/// Join key for matching articles across snapshots
pub fn normalized_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Compare the previous snapshot against freshly fetched metrics/articles.
pub fn compute_diff(
    old: &Snapshot,
    metrics: &ProfileMetrics,
    articles: &[Article],
) -> CitationDiff {
    let mut old_articles: HashMap<String, &Article> = HashMap::new();
    for article in &old.articles {
        let key = normalized_title(&article.title);
        if !key.is_empty() {
            old_articles.insert(key, article);
        }
    }

    let mut articles_with_new_citations = Vec::new();
    for article in articles {
        let title = article.title.trim();
        let old_count = old_articles
            .get(&normalized_title(title))
            .map(|a| a.citation_count)
            .unwrap_or(0);

        if article.citation_count > old_count {
            articles_with_new_citations.push(ArticleDelta {
                title: title.to_string(),
                old_count,
                new_count: article.citation_count,
                gained: article.citation_count - old_count,
                year: article.year.clone(),
            });
        }
    }

    let new_total = metrics.total_citations;
    CitationDiff {
        total_citations: TotalDelta {
            old: old.total_citations,
            new: new_total,
            gained: new_total as i64 - old.total_citations as i64,
        },
        h_index: IndexDelta {
            old: old.h_index,
            new: metrics.h_index,
        },
        i10_index: IndexDelta {
            old: old.i10_index,
            new: metrics.i10_index,
        },
        articles_with_new_citations,
        has_changes: new_total > old.total_citations,
    }
}
