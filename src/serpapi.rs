//! SerpAPI client for Google Scholar author profiles.
//!
//! Fetches aggregate citation metrics and the paginated article list via the
//! `google_scholar_author` engine. Every upstream field is decoded as
//! optional with a defined default, so minor schema drift degrades to zeros
//! instead of failing the whole run. An `error` payload from the API is
//! fatal: this is a low-frequency batch job with no retry policy.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::snapshot::Article;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// SerpAPI search endpoint
const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// Articles per page (SerpAPI caps `num` at 100)
const PAGE_SIZE: usize = 100;

/// Stop paging once the offset passes this many articles, to bound the run
/// against a remote source that never returns an empty page
const MAX_ARTICLES: usize = 500;

/// Aggregate metrics reported by the profile page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileMetrics {
    pub total_citations: u64,
    pub h_index: u64,
    pub i10_index: u64,
    /// Author affiliation, when the response carries one
    pub affiliation: Option<String>,
}

/// SerpAPI client for one author profile
pub struct ScholarClient {
    client: reqwest::Client,
    author_id: String,
    api_key: String,
}

impl ScholarClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TrackerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            author_id: config.author_id.clone(),
            api_key: config.serpapi_key.clone(),
        })
    }

    /// Fetch the author profile and extract aggregate metrics.
    pub async fn fetch_profile(&self) -> Result<ProfileMetrics> {
        info!(author_id = %self.author_id, "Fetching Google Scholar profile");
        let data = self.get_page(None).await?;
        Ok(extract_metrics(&data))
    }

    /// Fetch all articles, paging by offset until a page comes back empty or
    /// the safety cap is reached.
    pub async fn fetch_all_articles(&self) -> Result<Vec<Article>> {
        let mut all_articles = Vec::new();
        let mut start = 0;

        loop {
            info!(offset = start, "Fetching articles page");
            let data = self.get_page(Some(start)).await?;

            if data.articles.is_empty() {
                break;
            }

            all_articles.extend(data.articles.into_iter().map(Article::from));
            start += PAGE_SIZE;

            if start > MAX_ARTICLES {
                break;
            }
        }

        info!(total = all_articles.len(), "Article fetch complete");
        Ok(all_articles)
    }

    /// Issue one profile request. `start` present means an article page;
    /// absent means the initial profile request.
    async fn get_page(&self, start: Option<usize>) -> Result<AuthorResponse> {
        let num = PAGE_SIZE.to_string();
        let mut params = vec![
            ("engine", "google_scholar_author".to_string()),
            ("author_id", self.author_id.clone()),
            ("api_key", self.api_key.clone()),
            ("hl", "en".to_string()),
            ("num", num),
        ];
        if let Some(offset) = start {
            params.push(("start", offset.to_string()));
            params.push(("sort", "pubdate".to_string()));
        }

        debug!(url = SERPAPI_URL, start = ?start, "Sending SerpAPI request");

        let response = self.client.get(SERPAPI_URL).query(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                status: Some(status.as_u16()),
                message: format!("request failed with status {}: {}", status, error_text),
            });
        }

        let data: AuthorResponse = response.json().await?;
        check_payload(data)
    }
}

/// Reject responses carrying an `error` payload
fn check_payload(data: AuthorResponse) -> Result<AuthorResponse> {
    if let Some(message) = data.error {
        return Err(TrackerError::Api {
            status: None,
            message,
        });
    }
    Ok(data)
}

/// Scan the `cited_by.table` rows for the three aggregate metrics.
///
/// Each row carries at most one of the metric keys, so the whole table is
/// walked and whichever rows are present win.
fn extract_metrics(data: &AuthorResponse) -> ProfileMetrics {
    let mut metrics = ProfileMetrics {
        affiliation: data.author.as_ref().and_then(|a| a.affiliations.clone()),
        ..ProfileMetrics::default()
    };

    if let Some(cited_by) = &data.cited_by {
        for row in &cited_by.table {
            if let Some(citations) = &row.citations {
                metrics.total_citations = citations.all;
            }
            if let Some(h_index) = &row.h_index {
                metrics.h_index = h_index.all;
            }
            if let Some(i10_index) = &row.i10_index {
                metrics.i10_index = i10_index.all;
            }
        }
    }

    metrics
}

// === SerpAPI response types ===

#[derive(Debug, Deserialize)]
struct AuthorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    author: Option<AuthorBlock>,
    #[serde(default)]
    cited_by: Option<CitedBy>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct AuthorBlock {
    #[serde(default)]
    affiliations: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CitedBy {
    #[serde(default)]
    table: Vec<MetricRow>,
}

#[derive(Debug, Deserialize)]
struct MetricRow {
    #[serde(default)]
    citations: Option<MetricValue>,
    #[serde(default)]
    h_index: Option<MetricValue>,
    #[serde(default)]
    i10_index: Option<MetricValue>,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    #[serde(default)]
    all: u64,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    authors: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    cited_by: Option<ArticleCitedBy>,
}

#[derive(Debug, Deserialize)]
struct ArticleCitedBy {
    #[serde(default)]
    value: Option<u64>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Article {
            title: raw.title.unwrap_or_default(),
            citation_count: raw.cited_by.and_then(|c| c.value).unwrap_or(0),
            year: raw.year.unwrap_or_default(),
            link: raw.link.unwrap_or_default(),
            authors: raw.authors.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AuthorResponse {
        serde_json::from_str(json).expect("fixture should parse")
    }

    #[test]
    fn metrics_extracted_from_table_rows() {
        let data = parse(
            r#"{
                "author": {"name": "Ada Lovelace", "affiliations": "Analytical Engines Ltd"},
                "cited_by": {"table": [
                    {"citations": {"all": 1234}},
                    {"h_index": {"all": 17}},
                    {"i10_index": {"all": 25}}
                ]}
            }"#,
        );

        let metrics = extract_metrics(&data);
        assert_eq!(metrics.total_citations, 1234);
        assert_eq!(metrics.h_index, 17);
        assert_eq!(metrics.i10_index, 25);
        assert_eq!(metrics.affiliation.as_deref(), Some("Analytical Engines Ltd"));
    }

    #[test]
    fn missing_table_defaults_to_zero() {
        let data = parse(r#"{"author": {"name": "Ada Lovelace"}}"#);
        let metrics = extract_metrics(&data);
        assert_eq!(metrics.total_citations, 0);
        assert_eq!(metrics.h_index, 0);
        assert_eq!(metrics.i10_index, 0);
        assert!(metrics.affiliation.is_none());
    }

    #[test]
    fn error_payload_is_fatal() {
        let data = parse(r#"{"error": "Invalid API key"}"#);
        let result = check_payload(data);
        assert!(matches!(
            result,
            Err(TrackerError::Api { status: None, ref message }) if message == "Invalid API key"
        ));
    }

    #[test]
    fn clean_payload_passes_through() {
        let data = parse(r#"{"articles": [{"title": "Foo"}]}"#);
        let data = check_payload(data).expect("no error payload");
        assert_eq!(data.articles.len(), 1);
    }

    #[test]
    fn article_fields_default_when_absent() {
        let data = parse(
            r#"{"articles": [
                {"title": "On Computable Numbers", "year": "1936",
                 "link": "https://example.org/turing36",
                 "authors": "A. Turing",
                 "cited_by": {"value": 42}},
                {"title": "Untitled Draft", "cited_by": {}},
                {}
            ]}"#,
        );

        let articles: Vec<Article> = data.articles.into_iter().map(Article::from).collect();
        assert_eq!(articles[0].title, "On Computable Numbers");
        assert_eq!(articles[0].citation_count, 42);
        assert_eq!(articles[0].year, "1936");
        assert_eq!(articles[1].citation_count, 0);
        assert_eq!(articles[2].title, "");
        assert_eq!(articles[2].citation_count, 0);
    }

    #[test]
    fn null_cited_by_value_defaults_to_zero() {
        let data = parse(r#"{"articles": [{"title": "Foo", "cited_by": {"value": null}}]}"#);
        let article = Article::from(data.articles.into_iter().next().expect("one article"));
        assert_eq!(article.citation_count, 0);
    }
}
