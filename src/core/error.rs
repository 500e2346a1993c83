//! 运行级错误
//!
//! 除单篇总结失败（记录进失败列表）外，以下任何错误都会终止本次运行；
//! 投递错误一定发生在写状态之前，因此失败的运行不会留下任何持久化副作用。

use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FeedError;
use crate::mail::MailError;
use crate::state::StateError;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("feed fetch failed: {0}")]
    Feed(#[from] FeedError),

    #[error("delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}
