//! 核心编排层：运行级错误、共享重试策略与日报编排器

pub mod error;
pub mod orchestrator;
pub mod retry;

pub use error::DigestError;
pub use orchestrator::{DigestRunner, RunReport};
pub use retry::{RetryConfig, RetryFailure};
