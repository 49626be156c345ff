//! CI run summary.
//!
//! Appends a short human-readable markdown summary to the path in
//! `GITHUB_STEP_SUMMARY` when that variable is set. A convenience for
//! scheduled-workflow logs, not required for correctness — write failures
//! are the caller's to log, never to fail the run on.

use crate::diff::CitationDiff;
use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Most article rows shown in the summary table
const MAX_SUMMARY_ARTICLES: usize = 10;

/// Titles longer than this are cut before the ellipsis
const MAX_TITLE_CHARS: usize = 60;

/// Render the markdown summary for one run
pub fn render_summary(diff: &CitationDiff) -> String {
    if !diff.has_changes {
        return format!(
            "## ✅ No New Citations\n\nTotal citations remain at **{}**.\n",
            diff.total_citations.new
        );
    }

    let mut summary = format!(
        "## 🎉 +{} New Citations Detected!\n\n\
         - **Total Citations:** {}\n\
         - **h-index:** {}\n\
         - **i10-index:** {}\n\n",
        diff.total_citations.gained,
        diff.total_citations.new,
        diff.h_index.new,
        diff.i10_index.new,
    );

    if !diff.articles_with_new_citations.is_empty() {
        summary.push_str("### Papers with New Citations\n\n");
        summary.push_str("| Paper | Before | After | New |\n");
        summary.push_str("|-------|--------|-------|-----|\n");
        for delta in diff
            .articles_with_new_citations
            .iter()
            .take(MAX_SUMMARY_ARTICLES)
        {
            let title: String = delta.title.chars().take(MAX_TITLE_CHARS).collect();
            summary.push_str(&format!(
                "| {}… | {} | {} | +{} |\n",
                title, delta.old_count, delta.new_count, delta.gained
            ));
        }
    }

    summary
}

/// Append the rendered summary to the step-summary file
pub fn append_summary(path: &Path, diff: &CitationDiff) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(render_summary(diff).as_bytes())?;
    info!(path = ?path, "Step summary appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ArticleDelta, IndexDelta, TotalDelta};
    use tempfile::TempDir;

    fn diff(gained: i64, articles: Vec<ArticleDelta>) -> CitationDiff {
        CitationDiff {
            total_citations: TotalDelta {
                old: 100,
                new: (100 + gained) as u64,
                gained,
            },
            h_index: IndexDelta { old: 9, new: 10 },
            i10_index: IndexDelta { old: 8, new: 9 },
            articles_with_new_citations: articles,
            has_changes: gained > 0,
        }
    }

    fn delta(title: &str, gained: u64) -> ArticleDelta {
        ArticleDelta {
            title: title.to_string(),
            old_count: 1,
            new_count: 1 + gained,
            gained,
            year: "2021".to_string(),
        }
    }

    #[test]
    fn no_changes_variant() {
        let summary = render_summary(&diff(0, vec![]));
        assert!(summary.contains("## ✅ No New Citations"));
        assert!(summary.contains("remain at **100**"));
    }

    #[test]
    fn changes_variant_lists_metrics() {
        let summary = render_summary(&diff(3, vec![]));
        assert!(summary.contains("## 🎉 +3 New Citations Detected!"));
        assert!(summary.contains("- **Total Citations:** 103"));
        assert!(summary.contains("- **h-index:** 10"));
        assert!(summary.contains("- **i10-index:** 9"));
        // no table without article deltas
        assert!(!summary.contains("| Paper |"));
    }

    #[test]
    fn table_caps_at_ten_rows() {
        let articles: Vec<ArticleDelta> =
            (0..15).map(|i| delta(&format!("Paper-{:02}", i), 1)).collect();
        let summary = render_summary(&diff(15, articles));
        assert!(summary.contains("Paper-00"));
        assert!(summary.contains("Paper-09"));
        assert!(!summary.contains("Paper-10"));
    }

    #[test]
    fn long_titles_truncated_on_char_boundary() {
        let long = "é".repeat(80);
        let summary = render_summary(&diff(1, vec![delta(&long, 1)]));
        let row = summary
            .lines()
            .find(|l| l.starts_with("| é"))
            .expect("table row");
        let cell = row.trim_start_matches("| ");
        let title_part = cell.split('…').next().expect("title cell");
        assert_eq!(title_part.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn append_accumulates_across_runs() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("summary.md");

        append_summary(&path, &diff(2, vec![delta("A", 2)]))?;
        append_summary(&path, &diff(0, vec![]))?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.contains("+2 New Citations Detected"));
        assert!(content.contains("No New Citations"));
        let first = content.find("🎉").expect("first header");
        let second = content.find("✅").expect("second header");
        assert!(first < second);
        Ok(())
    }
}
