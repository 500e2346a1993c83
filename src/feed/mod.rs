//! 论文来源：arXiv Atom API 抓取与解析

pub mod arxiv;
pub mod atom;
pub mod paper;

use async_trait::async_trait;
use thiserror::Error;

pub use arxiv::{build_query, window_start, ArxivClient, ARXIV_API_URL};
pub use paper::{format_authors, ArxivPaper, Author};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("categories must not be empty")]
    EmptyCategories,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Atom parse error: {0}")]
    Xml(String),

    #[error("since_hours={0} reaches outside the representable time range")]
    WindowOutOfRange(u32),

    #[error("entry is missing <{0}>")]
    MissingField(&'static str),

    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// 一次抓取的查询窗口
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub categories: Vec<String>,
    /// 额外的标题检索词（`ti:"..."`），与分类 OR 组合
    pub title_terms: Vec<String>,
    pub since_hours: u32,
    pub max_results: usize,
}

/// 论文来源：返回按 updated 降序、且在时间窗口内的论文
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_recent(&self, query: &FeedQuery) -> Result<Vec<ArxivPaper>, FeedError>;
}
