//! 论文记录

use chrono::{DateTime, Utc};

/// 作者：姓名 + 可选机构（arxiv:affiliation）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub name: String,
    pub affiliation: Option<String>,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.affiliation {
            Some(aff) if !aff.trim().is_empty() => write!(f, "{} ({})", self.name, aff.trim()),
            _ => f.write_str(&self.name),
        }
    }
}

/// 从 arXiv Atom 条目解析出的一篇论文
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivPaper {
    /// 带版本号的 id，如 2501.01234v2
    pub arxiv_id: String,
    pub title: String,
    /// 摘要（已压缩空白）
    pub summary: String,
    pub authors: Vec<Author>,
    pub categories: Vec<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub link_abs: String,
    pub link_pdf: Option<String>,
}

/// 作者列表格式化为 "A (Org), B"
pub fn format_authors(authors: &[Author]) -> String {
    authors
        .iter()
        .filter(|a| !a.name.trim().is_empty())
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 合并连续空白为单个空格
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
