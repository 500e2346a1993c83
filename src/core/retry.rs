//! 有限次重试：LLM 请求与 SMTP 投递共用同一退避策略

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// 重试策略：第 n 次失败后等待 min(max_delay, base_delay * 2^(n-1)) + jitter_step * n
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(8),
            jitter_step: Duration::from_millis(50),
        }
    }
}

/// 重试结束时的失败原因
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// 不可重试的错误，首次出现即返回
    Fatal(E),
    /// 次数用尽，携带最后一次错误
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryFailure<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { last, .. } => last,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时长
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        exp.min(self.max_delay) + self.jitter_step.saturating_mul(attempt)
    }

    /// 执行 `op` 直到成功、遇到 `retryable` 判定为否的错误或次数用尽
    pub async fn run<T, E, F, Fut, R>(
        &self,
        label: &str,
        mut op: F,
        retryable: R,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !retryable(&err) {
                return Err(RetryFailure::Fatal(err));
            }
            if attempt >= attempts {
                return Err(RetryFailure::Exhausted {
                    attempts,
                    last: err,
                });
            }
            let delay = self.delay_for(attempt);
            tracing::warn!(
                "{} attempt {}/{} failed ({}), retrying in {:?}",
                label,
                attempt,
                attempts,
                err,
                delay
            );
            drop(err);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
