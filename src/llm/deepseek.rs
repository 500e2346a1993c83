//! DeepSeek API 客户端（OpenAI 兼容格式）
//!
//! DeepSeek 提供与 OpenAI 完全兼容的 API 接口。
//! - Base URL: https://api.deepseek.com
//! - 默认模型: deepseek-chat

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmSection;
use crate::core::RetryConfig;
use crate::llm::{LlmClient, OpenAiClient, RetryingLlmClient};

/// DeepSeek API 常量
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 创建 DeepSeek 客户端（带超时）
pub fn create_deepseek_client(
    api_key: &str,
    base_url: Option<&str>,
    model: Option<&str>,
    timeout_secs: u64,
) -> OpenAiClient {
    OpenAiClient::new(
        Some(base_url.unwrap_or(DEEPSEEK_BASE_URL)),
        model.unwrap_or(DEEPSEEK_CHAT),
        api_key,
    )
    .with_timeout(Duration::from_secs(timeout_secs))
}

/// 按 [llm] 配置创建带重试的客户端；未配置 API Key 时返回 None（跳过总结）
pub fn create_llm_from_config(cfg: &LlmSection) -> Option<Arc<dyn LlmClient>> {
    let api_key = cfg.api_key.as_deref()?;
    tracing::info!("Using DeepSeek LLM ({})", cfg.model);
    let client = create_deepseek_client(
        api_key,
        Some(cfg.base_url.as_str()),
        Some(cfg.model.as_str()),
        cfg.timeout_secs,
    )
    .with_temperature(cfg.temperature);
    let retry = RetryConfig::default().with_max_attempts(cfg.max_retries);
    Some(Arc::new(RetryingLlmClient::new(Arc::new(client), retry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_api_key_disables_llm() {
        assert!(create_llm_from_config(&LlmSection::default()).is_none());
    }

    #[test]
    fn test_api_key_enables_llm() {
        let cfg = LlmSection {
            api_key: Some("sk-test".into()),
            temperature: 0.5,
            ..Default::default()
        };
        let client = create_llm_from_config(&cfg).unwrap();
        assert_eq!(client.token_usage(), (0, 0, 0));
    }
}
