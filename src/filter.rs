//! 关键词打分与筛选
//!
//! 标题 + 摘要小写后做子串匹配；每命中一个关键词得 1 分（关键词列表中的重复项会重复计分），
//! matched_keywords 去重并保留原顺序与原大小写。

use std::collections::HashSet;

use crate::feed::ArxivPaper;

#[derive(Debug, Clone)]
pub struct FilterResult {
    pub paper: ArxivPaper,
    pub score: usize,
    pub matched_keywords: Vec<String>,
}

pub fn score_paper(paper: ArxivPaper, keywords: &[String]) -> FilterResult {
    let hay = format!("{}\n{}", paper.title.to_lowercase(), paper.summary.to_lowercase());
    let mut score = 0;
    let mut matched = Vec::new();
    let mut seen = HashSet::new();
    for kw in keywords {
        let k = kw.trim().to_lowercase();
        if k.is_empty() || !hay.contains(&k) {
            continue;
        }
        score += 1;
        if seen.insert(kw.as_str()) {
            matched.push(kw.clone());
        }
    }
    FilterResult {
        paper,
        score,
        matched_keywords: matched,
    }
}

/// 保留 score >= min_score 的论文，按 score 降序、updated 降序排列
pub fn filter_papers(
    papers: Vec<ArxivPaper>,
    keywords: &[String],
    min_score: usize,
) -> Vec<FilterResult> {
    let mut results: Vec<FilterResult> = papers
        .into_iter()
        .map(|p| score_paper(p, keywords))
        .filter(|r| r.score >= min_score)
        .collect();
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.paper.updated.cmp(&a.paper.updated))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn paper(id: &str, title: &str, summary: &str, updated: &str) -> ArxivPaper {
        let updated: DateTime<Utc> = updated.parse().unwrap();
        ArxivPaper {
            arxiv_id: id.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            authors: vec![],
            categories: vec![],
            published: updated,
            updated,
            link_abs: format!("https://arxiv.org/abs/{}", id),
            link_pdf: None,
        }
    }

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_score_case_insensitive_title_and_abstract() {
        let p = paper(
            "2501.00001v1",
            "Scaling RLHF",
            "A Language Model study.",
            "2026-01-01T00:00:00Z",
        );
        let r = score_paper(p, &kws(&["rlhf", "language model", "diffusion"]));
        assert_eq!(r.score, 2);
        assert_eq!(r.matched_keywords, kws(&["rlhf", "language model"]));
    }

    #[test]
    fn test_duplicate_keywords_score_twice_listed_once() {
        let p = paper("2501.00001v1", "Agent", "", "2026-01-01T00:00:00Z");
        let r = score_paper(p, &kws(&["agent", "agent", "  "]));
        assert_eq!(r.score, 2);
        assert_eq!(r.matched_keywords, kws(&["agent"]));
    }

    #[test]
    fn test_filter_sorts_by_score_then_updated() {
        let papers = vec![
            paper("a", "agent", "", "2026-01-01T00:00:00Z"),
            paper("b", "agent alignment", "", "2026-01-01T00:00:00Z"),
            paper("c", "agent", "", "2026-01-03T00:00:00Z"),
            paper("d", "nothing here", "", "2026-01-04T00:00:00Z"),
        ];
        let results = filter_papers(papers, &kws(&["agent", "alignment"]), 1);
        let ids: Vec<_> = results.iter().map(|r| r.paper.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_filter_min_score() {
        let papers = vec![
            paper("a", "agent", "", "2026-01-01T00:00:00Z"),
            paper("b", "agent alignment", "", "2026-01-01T00:00:00Z"),
        ];
        let results = filter_papers(papers, &kws(&["agent", "alignment"]), 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].paper.arxiv_id, "b");
    }
}
