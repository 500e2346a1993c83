//! 总结 Prompt

use crate::feed::{format_authors, ArxivPaper};

pub const SYSTEM_PROMPT: &str = "你是一位严谨的科研助理，擅长快速阅读论文摘要并产出结构化中文总结。\n\
要求：信息准确，不夸大；当摘要没有提供细节时要明确说明。输出使用 Markdown。";

fn or_unknown(s: String) -> String {
    if s.trim().is_empty() {
        "(未知)".to_string()
    } else {
        s
    }
}

pub fn build_user_prompt(paper: &ArxivPaper, matched_keywords: &[String]) -> String {
    let kws = if matched_keywords.is_empty() {
        "(无)".to_string()
    } else {
        matched_keywords.join(", ")
    };
    format!(
        "请基于以下论文信息生成结构化中文总结：\n\n\
【标题】\n{title}\n\n\
【作者】\n{authors}\n\n\
【分类】\n{categories}\n\n\
【arXiv】\n{link}\n\n\
【更新时间(UTC)】\n{updated}\n\n\
【关键词命中】\n{kws}\n\n\
【摘要】\n{summary}\n\n\
输出格式（必须包含这些小标题）：\n\
1) 一句话结论\n\
2) 核心贡献（3-5条）\n\
3) 方法要点（3-5条）\n\
4) 实验与结果（若摘要未给出，写“摘要未提供细节”）\n\
5) 与强化学习/后训练/对齐的关联（1-3条）\n\
6) 局限与开放问题（1-3条）\n",
        title = paper.title,
        authors = or_unknown(format_authors(&paper.authors)),
        categories = or_unknown(paper.categories.join(", ")),
        link = paper.link_abs,
        updated = paper.updated.to_rfc3339(),
        kws = kws,
        summary = paper.summary,
    )
}
