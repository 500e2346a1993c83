//! arXiv Atom 响应解析（quick-xml 事件流）
//!
//! 只取需要的字段：id、updated、published、title、summary、author/name、
//! author/arxiv:affiliation、category@term、link@href/rel/type。命名空间前缀按 local name 忽略。

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::feed::paper::{collapse_whitespace, ArxivPaper, Author};
use crate::feed::FeedError;

/// 正在收集文本的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Updated,
    Published,
    Title,
    Summary,
    AuthorName,
    Affiliation,
}

#[derive(Debug, Clone)]
struct Link {
    href: String,
    rel: Option<String>,
    mime: Option<String>,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id: String,
    updated: String,
    published: String,
    title: String,
    summary: String,
    authors: Vec<Author>,
    categories: Vec<String>,
    links: Vec<Link>,
}

impl EntryBuilder {
    fn text_mut<'a>(
        &'a mut self,
        field: Field,
        author: Option<&'a mut Author>,
    ) -> Option<&'a mut String> {
        match field {
            Field::Id => Some(&mut self.id),
            Field::Updated => Some(&mut self.updated),
            Field::Published => Some(&mut self.published),
            Field::Title => Some(&mut self.title),
            Field::Summary => Some(&mut self.summary),
            Field::AuthorName => author.map(|a| &mut a.name),
            Field::Affiliation => author.map(|a| a.affiliation.get_or_insert_with(String::new)),
        }
    }

    fn push_element(&mut self, e: &BytesStart<'_>) -> Result<(), FeedError> {
        match e.local_name().as_ref() {
            b"link" => {
                let mut link = Link {
                    href: String::new(),
                    rel: None,
                    mime: None,
                };
                for (key, value) in attributes(e)? {
                    match key.as_str() {
                        "href" => link.href = value,
                        "rel" => link.rel = Some(value),
                        "type" => link.mime = Some(value),
                        _ => {}
                    }
                }
                if !link.href.is_empty() {
                    self.links.push(link);
                }
            }
            b"category" => {
                if let Some((_, term)) = attributes(e)?.into_iter().find(|(k, _)| k == "term") {
                    if !term.trim().is_empty() {
                        self.categories.push(term);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> Result<ArxivPaper, FeedError> {
        let entry_id = self.id.trim();
        if entry_id.is_empty() {
            return Err(FeedError::MissingField("id"));
        }
        if self.updated.trim().is_empty() {
            return Err(FeedError::MissingField("updated"));
        }
        let updated = parse_timestamp(&self.updated)?;
        let published = if self.published.trim().is_empty() {
            updated
        } else {
            parse_timestamp(&self.published)?
        };

        let mut link_abs = None;
        let mut link_pdf = None;
        for link in &self.links {
            if link.rel.as_deref() == Some("alternate") && link.href.starts_with("http") {
                link_abs = Some(link.href.clone());
            }
            if link.href.contains("pdf")
                && (link.mime.as_deref() == Some("application/pdf") || link.href.ends_with(".pdf"))
            {
                link_pdf = Some(link.href.clone());
            }
        }
        let link_abs = link_abs.unwrap_or_else(|| entry_id.replace("http://", "https://"));

        let authors = self
            .authors
            .into_iter()
            .map(|a| Author {
                name: collapse_whitespace(&a.name),
                affiliation: a.affiliation.map(|s| collapse_whitespace(&s)),
            })
            .filter(|a| !a.name.is_empty())
            .collect();

        Ok(ArxivPaper {
            arxiv_id: extract_arxiv_id(entry_id),
            title: collapse_whitespace(&self.title),
            summary: collapse_whitespace(&self.summary),
            authors,
            categories: self.categories,
            published,
            updated,
            link_abs,
            link_pdf,
        })
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, FeedError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| FeedError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| FeedError::Xml(err.to_string()))?
            .into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FeedError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| FeedError::Timestamp {
            value: raw.trim().to_string(),
            source,
        })
}

/// 条目 id 形如 http://arxiv.org/abs/2501.01234v2 或 http://arxiv.org/abs/hep-th/9901001v1
pub(crate) fn extract_arxiv_id(entry_id: &str) -> String {
    let id = entry_id.trim();
    match id.split_once("/abs/") {
        Some((_, rest)) => rest.trim_matches('/').to_string(),
        None => id.rsplit('/').next().unwrap_or(id).to_string(),
    }
}

/// 解析整个 feed，按文档顺序返回条目
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivPaper>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut author: Option<Author> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FeedError::Xml(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(e) => {
                let Some(builder) = entry.as_mut() else {
                    if e.local_name().as_ref() == b"entry" {
                        entry = Some(EntryBuilder::default());
                    }
                    continue;
                };
                field = match e.local_name().as_ref() {
                    b"author" => {
                        author = Some(Author::default());
                        None
                    }
                    b"id" => Some(Field::Id),
                    b"updated" => Some(Field::Updated),
                    b"published" => Some(Field::Published),
                    b"title" => Some(Field::Title),
                    b"summary" => Some(Field::Summary),
                    b"name" if author.is_some() => Some(Field::AuthorName),
                    b"affiliation" if author.is_some() => Some(Field::Affiliation),
                    _ => {
                        builder.push_element(&e)?;
                        None
                    }
                };
            }
            Event::Empty(e) => {
                if let Some(builder) = entry.as_mut() {
                    builder.push_element(&e)?;
                }
            }
            Event::Text(t) => {
                if let (Some(f), Some(builder)) = (field, entry.as_mut()) {
                    let text = t.unescape().map_err(|e| FeedError::Xml(e.to_string()))?;
                    if let Some(buf) = builder.text_mut(f, author.as_mut()) {
                        buf.push_str(&text);
                    }
                }
            }
            Event::CData(t) => {
                if let (Some(f), Some(builder)) = (field, entry.as_mut()) {
                    if let Some(buf) = builder.text_mut(f, author.as_mut()) {
                        buf.push_str(&String::from_utf8_lossy(&t));
                    }
                }
            }
            Event::End(e) => {
                field = None;
                match e.local_name().as_ref() {
                    b"author" => {
                        if let (Some(a), Some(builder)) = (author.take(), entry.as_mut()) {
                            builder.authors.push(a);
                        }
                    }
                    b"entry" => {
                        if let Some(builder) = entry.take() {
                            papers.push(builder.build()?);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(papers)
}
