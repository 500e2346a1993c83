//! Mock LLM 客户端（用于测试与本地试跑，无需 API）
//!
//! 取最后一条 User 消息的首个非空行，回显为一段固定格式的总结；
//! 若消息包含 `fail_on` 中任一片段则返回错误，用于模拟单篇总结失败。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, Role};

#[derive(Debug, Default)]
pub struct MockLlmClient {
    fail_on: Vec<String>,
    calls: AtomicU64,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用户消息包含任一片段时返回错误
    pub fn failing_on(fragments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fail_on: fragments.into_iter().map(Into::into).collect(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        if let Some(hit) = self.fail_on.iter().find(|f| last_user.contains(f.as_str())) {
            return Err(LlmError::Request(format!("mock failure for {}", hit)));
        }

        let headline = last_user
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("(empty)");
        Ok(format!("Mock summary: {}", headline))
    }
}
