//! HTML 正文（内联样式，自包含）

use super::{shorten, RenderItem, EMPTY_NOTICE, FAILED_HEADING};
use crate::feed::format_authors;

const BODY_STYLE: &str = "font-family: -apple-system, BlinkMacSystemFont, Segoe UI, Roboto, Helvetica, Arial, sans-serif; line-height:1.5;";
const CARD_STYLE: &str = "border:1px solid #e5e7eb; border-radius:10px; padding:14px; margin:12px 0;";
const BLOCK_STYLE: &str = "font-size:13px; color:#111827;";

/// 转义 HTML 特殊字符（文本与单引号属性值）
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_card(index: usize, it: &RenderItem, parts: &mut Vec<String>) {
    parts.push(format!("<div style='{}'>", CARD_STYLE));
    parts.push(format!(
        "<div style='font-size:16px; font-weight:700; margin-bottom:6px;'>{}. \
<a href='{}' style='text-decoration:none;'>{}</a></div>",
        index,
        escape_html(&it.link_abs),
        escape_html(&it.title)
    ));

    let mut meta = vec![format!("<b>arXiv</b>: {}", escape_html(&it.arxiv_id))];
    if !it.authors.is_empty() {
        meta.push(format!(
            "<b>Authors</b>: {}",
            escape_html(&format_authors(&it.authors))
        ));
    }
    if !it.categories.is_empty() {
        meta.push(format!(
            "<b>Categories</b>: {}",
            escape_html(&it.categories.join(", "))
        ));
    }
    meta.push(format!("<b>Updated</b>: {}", escape_html(&it.updated_iso)));
    if !it.matched_keywords.is_empty() {
        meta.push(format!(
            "<b>Matched</b>: {} (score={})",
            escape_html(&it.matched_keywords.join(", ")),
            it.score
        ));
    }
    parts.push(format!(
        "<div style='color:#374151; font-size:13px;'>{}</div>",
        meta.join("<br/>")
    ));
    parts.push("<hr style='border:none; border-top:1px solid #eee; margin:10px 0;'/>".to_string());

    parts.push(format!("<div style='{}'><b>Abstract</b></div>", BLOCK_STYLE));
    parts.push(format!(
        "<div style='{} white-space:pre-wrap;'>{}</div>",
        BLOCK_STYLE,
        escape_html(&shorten(&it.abstract_text, 900))
    ));
    parts.push("<div style='height:10px;'></div>".to_string());
    parts.push(format!("<div style='{}'><b>Summary</b></div>", BLOCK_STYLE));
    match &it.summary_md {
        // Markdown 原样以 pre-wrap 纯文本展示
        Some(md) => parts.push(format!(
            "<div style='{} white-space:pre-wrap;'>{}</div>",
            BLOCK_STYLE,
            escape_html(md)
        )),
        None => parts.push("<div style='font-size:13px; color:#6b7280;'>未生成/跳过</div>".to_string()),
    }
    parts.push("</div>".to_string());
}

pub(super) fn render_html(subject: &str, items: &[RenderItem], failed: &[String]) -> String {
    let mut parts = vec![
        "<!doctype html>".to_string(),
        "<html><head><meta charset='utf-8' />".to_string(),
        "<meta name='viewport' content='width=device-width, initial-scale=1' />".to_string(),
        format!("<title>{}</title>", escape_html(subject)),
        format!("</head><body style='{}'>", BODY_STYLE),
        format!("<h2 style='margin:0 0 12px 0;'>{}</h2>", escape_html(subject)),
    ];

    if items.is_empty() {
        parts.push(format!("<p>{}</p>", EMPTY_NOTICE));
    }
    for (i, it) in items.iter().enumerate() {
        render_card(i + 1, it, &mut parts);
    }

    if !failed.is_empty() {
        parts.push(format!("<h3 style='margin-top:18px;'>{}</h3>", FAILED_HEADING));
        parts.push("<ul>".to_string());
        parts.extend(failed.iter().map(|x| format!("<li>{}</li>", escape_html(x))));
        parts.push("</ul>".to_string());
    }

    parts.push("<p style='color:#6b7280; font-size:12px;'>此邮件由 arxiv-digest 自动生成。</p>".to_string());
    parts.push("</body></html>".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href='x'>"R&D"</a>"#),
            "&lt;a href=&#x27;x&#x27;&gt;&quot;R&amp;D&quot;&lt;/a&gt;"
        );
    }
}
