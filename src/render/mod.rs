//! 邮件渲染：主题、纯文本正文、HTML 正文
//!
//! 一次运行渲染一封邮件，包含本批所有论文以及总结失败的条目列表。

mod html;
mod text;

use crate::feed::Author;

/// 渲染所需的单篇论文信息
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub title: String,
    pub arxiv_id: String,
    pub link_abs: String,
    pub authors: Vec<Author>,
    pub categories: Vec<String>,
    pub updated_iso: String,
    pub matched_keywords: Vec<String>,
    pub abstract_text: String,
    /// LLM 总结（Markdown）；None 表示未生成或跳过
    pub summary_md: Option<String>,
    pub score: usize,
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub(crate) const EMPTY_NOTICE: &str = "今天没有命中关键词的论文。";
pub(crate) const FAILED_HEADING: &str = "未总结成功的条目";

pub fn render_subject(subject_prefix: &str, date_local: &str, count: usize) -> String {
    format!("{} {}（{}篇）", subject_prefix, date_local, count)
}

pub fn render_email(
    subject_prefix: &str,
    date_local: &str,
    items: &[RenderItem],
    failed: &[String],
) -> RenderedEmail {
    let subject = render_subject(subject_prefix, date_local, items.len());
    RenderedEmail {
        text: text::render_text(&subject, items, failed),
        html: html::render_html(&subject, items, failed),
        subject,
    }
}

/// 压缩空白并截断到 n 个字符（超出时末尾为 …）
pub(crate) fn shorten(text: &str, n: usize) -> String {
    let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if t.chars().count() <= n {
        return t;
    }
    let mut out: String = t.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}
