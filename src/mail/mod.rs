//! 邮件投递：Mailer 抽象与 SMTP 实现
//!
//! 投递失败对整次运行是致命的，且必须发生在任何状态写入之前。

pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

use crate::render::RenderedEmail;

pub use smtp::{build_message, SmtpMailer, SmtpSettings};

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("no recipients")]
    NoRecipients,

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// 邮件投递接口：一封摘要邮件发给全部收件人
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        from: &str,
        to: &[String],
        email: &RenderedEmail,
    ) -> Result<(), MailError>;
}
