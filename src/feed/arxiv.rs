//! arXiv API 客户端
//!
//! GET export.arxiv.org/api/query，按 lastUpdatedDate 降序；解析 Atom 后按 `since_hours` 截断。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::feed::atom::parse_feed;
use crate::feed::{ArxivPaper, FeedError, FeedQuery, FeedSource};

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// 构造 search_query：`(cat:A OR cat:B OR ti:"term")`
pub fn build_query(categories: &[String], title_terms: &[String]) -> Result<String, FeedError> {
    let mut parts: Vec<String> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("cat:{}", c))
        .collect();
    if parts.is_empty() {
        return Err(FeedError::EmptyCategories);
    }
    parts.extend(
        title_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| format!("ti:\"{}\"", t.replace('"', ""))),
    );
    Ok(format!("({})", parts.join(" OR ")))
}

/// 时间窗口起点：`now - since_hours` 小时；超出可表示的时间范围时报错
pub fn window_start(now: DateTime<Utc>, since_hours: u32) -> Result<DateTime<Utc>, FeedError> {
    chrono::Duration::try_hours(i64::from(since_hours))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(FeedError::WindowOutOfRange(since_hours))
}

/// feed 已按 updated 降序，遇到第一条早于 cutoff 的条目即停止
pub fn take_since(papers: Vec<ArxivPaper>, cutoff: DateTime<Utc>) -> Vec<ArxivPaper> {
    papers.into_iter().take_while(|p| p.updated >= cutoff).collect()
}

pub struct ArxivClient {
    client: Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new(base_url: Option<&str>, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("arxiv-digest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.unwrap_or(ARXIV_API_URL).to_string(),
        })
    }

    async fn fetch_xml(&self, search_query: &str, max_results: usize) -> Result<String, FeedError> {
        let params = [
            ("search_query", search_query.to_string()),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "lastUpdatedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ];
        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl FeedSource for ArxivClient {
    async fn fetch_recent(&self, query: &FeedQuery) -> Result<Vec<ArxivPaper>, FeedError> {
        let q = build_query(&query.categories, &query.title_terms)?;
        let cutoff = window_start(Utc::now(), query.since_hours)?;
        tracing::debug!("arXiv query: {}", q);
        let xml = self.fetch_xml(&q, query.max_results).await?;
        let papers = parse_feed(&xml)?;
        let total = papers.len();
        let recent = take_since(papers, cutoff);
        tracing::debug!(
            "arXiv returned {} entries, {} updated since {}",
            total,
            recent.len(),
            cutoff.to_rfc3339()
        );
        Ok(recent)
    }
}
