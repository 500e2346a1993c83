//! arxiv-digest - arXiv 论文日报
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 运行级错误与日报编排器
//! - **feed**: arXiv API 抓取与 Atom 解析
//! - **filter**: 关键词打分与筛选
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **mail**: 邮件投递（SMTP）
//! - **observability**: 日志初始化
//! - **render**: 邮件主题 / 纯文本 / HTML 渲染
//! - **state**: 已推送状态（去重、按版本重发、原子持久化）
//! - **summarizer**: 逐篇 LLM 总结

pub mod config;
pub mod core;
pub mod feed;
pub mod filter;
pub mod llm;
pub mod mail;
pub mod observability;
pub mod render;
pub mod state;
pub mod summarizer;

pub use crate::core::{DigestError, DigestRunner, RunReport};
pub use crate::state::StateStore;
