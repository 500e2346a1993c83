//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient；RetryingLlmClient 为任意实现加上有限次重试。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::retry::{RetryConfig, RetryFailure};
use crate::llm::Message;

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("all {attempts} attempts failed, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LlmError> },
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 返回首条候选的文本内容（已 trim）
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 带重试的包装客户端
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    retry: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.retry
            .run(
                "LLM",
                || self.inner.complete(messages),
                // 请求本身不合法时重试无意义
                |e: &LlmError| !matches!(e, LlmError::InvalidRequest(_)),
            )
            .await
            .map_err(|failure| match failure {
                RetryFailure::Fatal(e) => e,
                RetryFailure::Exhausted { attempts, last } => LlmError::RetriesExhausted {
                    attempts,
                    last: Box::new(last),
                },
            })
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::tests::fast_retry;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(LlmError::Request("503".into()));
            }
            Ok("ok".into())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let inner = Arc::new(FlakyClient {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast_retry(3));
        let out = client.complete(&[Message::user("hi")]).await.unwrap();
        assert_eq!(out, "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let inner = Arc::new(FlakyClient {
            failures_left: AtomicU32::new(10),
            calls: AtomicU32::new(0),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast_retry(2));
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    struct RejectingClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for RejectingClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::InvalidRequest("empty messages".into()))
        }
    }

    #[tokio::test]
    async fn test_invalid_request_not_retried() {
        let inner = Arc::new(RejectingClient {
            calls: AtomicU32::new(0),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast_retry(3));
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
