//! 纯文本正文

use super::{shorten, RenderItem, EMPTY_NOTICE, FAILED_HEADING};
use crate::feed::format_authors;

pub(super) fn render_text(subject: &str, items: &[RenderItem], failed: &[String]) -> String {
    let mut lines: Vec<String> = vec![subject.to_string(), String::new()];
    if items.is_empty() {
        lines.push(EMPTY_NOTICE.to_string());
    }
    for (i, it) in items.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, it.title));
        lines.push(format!("   arXiv: {}", it.arxiv_id));
        lines.push(format!("   Link: {}", it.link_abs));
        if !it.authors.is_empty() {
            lines.push(format!("   Authors: {}", format_authors(&it.authors)));
        }
        if !it.categories.is_empty() {
            lines.push(format!("   Categories: {}", it.categories.join(", ")));
        }
        if !it.matched_keywords.is_empty() {
            lines.push(format!(
                "   Matched: {} (score={})",
                it.matched_keywords.join(", "),
                it.score
            ));
        }
        lines.push(format!("   Updated: {}", it.updated_iso));
        lines.push("   Abstract:".to_string());
        lines.push(format!("   {}", shorten(&it.abstract_text, 600)));
        match &it.summary_md {
            Some(md) => {
                lines.push("   Summary:".to_string());
                lines.extend(md.lines().map(|ln| format!("   {}", ln)));
            }
            None => lines.push("   Summary: (未生成/跳过)".to_string()),
        }
        lines.push(String::new());
    }
    if !failed.is_empty() {
        lines.push(format!("{}：", FAILED_HEADING));
        lines.extend(failed.iter().map(|x| format!("- {}", x)));
        lines.push(String::new());
    }
    format!("{}\n", lines.join("\n").trim())
}
