//! 论文总结：每篇论文一次 LLM 调用

pub mod prompt;

use std::sync::Arc;

use crate::feed::ArxivPaper;
use crate::llm::{LlmClient, LlmError, Message};

pub use prompt::{build_user_prompt, SYSTEM_PROMPT};

pub struct Summarizer {
    client: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn summarize_one(
        &self,
        paper: &ArxivPaper,
        matched_keywords: &[String],
    ) -> Result<String, LlmError> {
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(paper, matched_keywords)),
        ];
        self.client.complete(&messages).await
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.client.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Author;
    use crate::llm::MockLlmClient;

    fn sample_paper() -> ArxivPaper {
        let updated = "2026-01-02T10:00:00Z".parse().unwrap();
        ArxivPaper {
            arxiv_id: "2501.00002v2".into(),
            title: "Policy Optimization for Agents".into(),
            summary: "We study RLHF.".into(),
            authors: vec![Author {
                name: "Alice".into(),
                affiliation: Some("MIT".into()),
            }],
            categories: vec!["cs.LG".into()],
            published: updated,
            updated,
            link_abs: "https://arxiv.org/abs/2501.00002v2".into(),
            link_pdf: None,
        }
    }

    #[test]
    fn test_user_prompt_contains_paper_fields() {
        let prompt = build_user_prompt(&sample_paper(), &["rlhf".to_string()]);
        assert!(prompt.contains("Policy Optimization for Agents"));
        assert!(prompt.contains("Alice (MIT)"));
        assert!(prompt.contains("cs.LG"));
        assert!(prompt.contains("https://arxiv.org/abs/2501.00002v2"));
        assert!(prompt.contains("2026-01-02T10:00:00+00:00"));
        assert!(prompt.contains("rlhf"));
    }

    #[test]
    fn test_user_prompt_placeholders() {
        let mut paper = sample_paper();
        paper.authors.clear();
        paper.categories.clear();
        let prompt = build_user_prompt(&paper, &[]);
        assert!(prompt.contains("【作者】\n(未知)"));
        assert!(prompt.contains("【关键词命中】\n(无)"));
    }

    #[tokio::test]
    async fn test_summarize_one_uses_client() {
        let summarizer = Summarizer::new(Arc::new(MockLlmClient::new()));
        let out = summarizer.summarize_one(&sample_paper(), &[]).await.unwrap();
        assert_eq!(out, "Mock summary: 请基于以下论文信息生成结构化中文总结：");
    }
}
