//! SMTP 投递（lettre，tokio 异步传输）
//!
//! 支持三种连接方式：隐式 TLS（use_ssl）、STARTTLS（默认）、明文；失败时按 RetryConfig 重试。

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailSection;
use crate::core::{RetryConfig, RetryFailure};
use crate::mail::{MailError, Mailer};
use crate::render::RenderedEmail;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_ssl: bool,
    pub starttls: bool,
    pub timeout: Duration,
}

impl SmtpSettings {
    /// 从 [mail] 配置取 SMTP 参数；缺项时返回 None（由配置校验提前报错）
    pub fn from_config(cfg: &MailSection) -> Option<Self> {
        Some(Self {
            host: cfg.smtp_host.clone()?,
            port: cfg.smtp_port,
            username: cfg.smtp_user.clone()?,
            password: cfg.smtp_pass.clone()?,
            use_ssl: cfg.use_ssl,
            starttls: cfg.starttls,
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// 构造 multipart/alternative（纯文本 + HTML）邮件
pub fn build_message(
    from: &str,
    to: &[String],
    email: &RenderedEmail,
) -> Result<Message, MailError> {
    if to.is_empty() {
        return Err(MailError::NoRecipients);
    }
    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .subject(email.subject.clone());
    for addr in to {
        builder = builder.to(parse_mailbox(addr)?);
    }
    let body = MultiPart::alternative_plain_html(email.text.clone(), email.html.clone());
    Ok(builder.multipart(body)?)
}

pub struct SmtpMailer {
    settings: SmtpSettings,
    retry: RetryConfig,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings, retry: RetryConfig) -> Self {
        Self { settings, retry }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let s = &self.settings;
        let builder = if s.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&s.host)?
        } else if s.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&s.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&s.host)
        };
        Ok(builder
            .port(s.port)
            .credentials(Credentials::new(s.username.clone(), s.password.clone()))
            .timeout(Some(s.timeout))
            .build())
    }
}

/// 通过任意 lettre 异步传输投递，失败时按 RetryConfig 重试；返回最后一次错误
async fn deliver<T>(
    transport: &T,
    message: &Message,
    retry: &RetryConfig,
    target: &str,
) -> Result<(), T::Error>
where
    T: AsyncTransport + Sync,
    T::Error: std::fmt::Display,
{
    let label = format!("SMTP {}", target);
    retry
        .run(&label, || transport.send(message.clone()), |_: &T::Error| true)
        .await
        .map(|_| ())
        .map_err(RetryFailure::into_inner)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        from: &str,
        to: &[String],
        email: &RenderedEmail,
    ) -> Result<(), MailError> {
        let message = build_message(from, to, email)?;
        let transport = self.transport()?;
        let target = format!("{}:{}", self.settings.host, self.settings.port);
        deliver(&transport, &message, &self.retry, &target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::tests::fast_retry;
    use lettre::address::Envelope;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    /// 前 `failures` 次发送失败，之后成功
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyTransport {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AsyncTransport for FlakyTransport {
        type Ok = ();
        type Error = Refused;

        async fn send_raw(&self, _envelope: &Envelope, _email: &[u8]) -> Result<(), Refused> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(Refused)
            } else {
                Ok(())
            }
        }
    }

    fn email() -> RenderedEmail {
        RenderedEmail {
            subject: "[arXiv日报] 2026-01-02（1篇）".into(),
            text: "plain body".into(),
            html: "<p>html body</p>".into(),
        }
    }

    #[test]
    fn test_build_message_multipart() {
        let to = vec!["a@example.com".to_string(), " Bob <b@example.com> ".to_string()];
        let message = build_message("digest@example.com", &to, &email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("plain body"));
        assert!(raw.contains("<p>html body</p>"));
        assert!(raw.contains("b@example.com"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let to = vec!["not an address".to_string()];
        let err = build_message("digest@example.com", &to, &email()).unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[test]
    fn test_build_message_requires_recipients() {
        let err = build_message("digest@example.com", &[], &email()).unwrap_err();
        assert!(matches!(err, MailError::NoRecipients));
    }

    #[test]
    fn test_settings_require_credentials() {
        let mut cfg = MailSection::default();
        assert!(SmtpSettings::from_config(&cfg).is_none());
        cfg.smtp_host = Some("smtp.example.com".into());
        cfg.smtp_user = Some("user".into());
        cfg.smtp_pass = Some("pass".into());
        let s = SmtpSettings::from_config(&cfg).unwrap();
        assert_eq!(s.port, 587);
        assert!(s.starttls);
    }

    #[tokio::test]
    async fn test_deliver_retries_until_success() {
        let to = vec!["a@example.com".to_string()];
        let message = build_message("digest@example.com", &to, &email()).unwrap();
        let transport = FlakyTransport::new(2);
        deliver(&transport, &message, &fast_retry(3), "smtp.example.com:587")
            .await
            .unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deliver_gives_up_after_max_attempts() {
        let to = vec!["a@example.com".to_string()];
        let message = build_message("digest@example.com", &to, &email()).unwrap();
        let transport = FlakyTransport::new(u32::MAX);
        let err = deliver(&transport, &message, &fast_retry(3), "smtp.example.com:587")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }
}
