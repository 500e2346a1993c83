//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `DIGEST__*` 覆盖（双下划线表示嵌套，如 `DIGEST__STATE__RESEND_ON_UPDATE=true`）。
//! 列表键（arxiv.categories / arxiv.keywords / arxiv.title_terms / mail.to）可用逗号分隔。
//! 密钥未在配置中给出时回退到 `DEEPSEEK_API_KEY`、`SMTP_PASS`。

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::llm::deepseek::{DEEPSEEK_BASE_URL, DEEPSEEK_CHAT};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub arxiv: ArxivSection,
    pub state: StateSection,
    pub llm: LlmSection,
    pub mail: MailSection,
    pub render: RenderSection,
}

pub const DEFAULT_KEYWORDS: &[&str] = &[
    // RL / optimization
    "reinforcement learning",
    "policy optimization",
    "rl",
    // post-training / alignment
    "post-training",
    "alignment",
    "rlhf",
    "preference optimization",
    // extras
    "llm",
    "language model",
    "agent",
];

/// [arxiv] 段：抓取范围与筛选
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArxivSection {
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    /// 额外的标题检索词，与分类 OR 组合进 search_query
    pub title_terms: Vec<String>,
    /// 只保留最近 N 小时内更新的论文
    pub since_hours: u32,
    /// 单次请求的最大条数
    pub limit: usize,
    pub min_score: usize,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ArxivSection {
    fn default() -> Self {
        Self {
            categories: vec!["cs.AI".into(), "cs.LG".into(), "stat.ML".into()],
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            title_terms: Vec::new(),
            since_hours: 24,
            limit: 50,
            min_score: 1,
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// [state] 段：状态文件与重发策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateSection {
    pub path: PathBuf,
    /// 已推送论文出现新版本时是否重新推送
    pub resend_on_update: bool,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/state.json"),
            resend_on_update: false,
        }
    }
}

/// [llm] 段：DeepSeek（OpenAI 兼容）；api_key 为空时跳过总结
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEEPSEEK_BASE_URL.to_string(),
            model: DEEPSEEK_CHAT.to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

/// [mail] 段：SMTP 与收发件人
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSection {
    /// 只渲染并打印，不发信、不写状态
    pub dry_run: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub use_ssl: bool,
    pub starttls: bool,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// 本次没有需要推送的论文时不发信
    pub skip_empty: bool,
}

impl Default for MailSection {
    fn default() -> Self {
        Self {
            dry_run: false,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
            use_ssl: false,
            starttls: true,
            from: None,
            to: Vec::new(),
            timeout_secs: 30,
            max_retries: 3,
            skip_empty: false,
        }
    }
}

/// [render] 段：邮件主题前缀与日期所用时区
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub subject_prefix: String,
    /// IANA 时区名，无法识别时使用 UTC
    pub timezone: String,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            subject_prefix: "[arXiv日报]".to_string(),
            timezone: "Asia/Shanghai".to_string(),
        }
    }
}

impl RenderSection {
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, falling back to UTC", self.timezone);
            chrono_tz::UTC
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean_list(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    /// 规整：去掉空白项、空字符串视为未设置，并回退到常用的密钥环境变量
    fn normalize(mut self) -> Self {
        self.arxiv.categories = clean_list(self.arxiv.categories);
        self.arxiv.keywords = clean_list(self.arxiv.keywords);
        self.arxiv.title_terms = clean_list(self.arxiv.title_terms);
        self.mail.to = clean_list(self.mail.to);

        self.llm.api_key = non_empty(self.llm.api_key)
            .or_else(|| non_empty(std::env::var("DEEPSEEK_API_KEY").ok()));
        self.mail.smtp_pass =
            non_empty(self.mail.smtp_pass).or_else(|| non_empty(std::env::var("SMTP_PASS").ok()));
        self.mail.smtp_host = non_empty(self.mail.smtp_host);
        self.mail.smtp_user = non_empty(self.mail.smtp_user);
        self.mail.from = non_empty(self.mail.from);
        self
    }

    /// 校验必填项；非 dry_run 时一次性列出全部缺失的 SMTP 配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arxiv.categories.is_empty() {
            return Err(ConfigError::Invalid("arxiv.categories must not be empty".into()));
        }
        if self.arxiv.since_hours == 0 {
            return Err(ConfigError::Invalid("arxiv.since_hours must be > 0".into()));
        }
        if crate::feed::window_start(chrono::Utc::now(), self.arxiv.since_hours).is_err() {
            return Err(ConfigError::Invalid(format!(
                "arxiv.since_hours={} is out of range",
                self.arxiv.since_hours
            )));
        }
        if self.arxiv.limit == 0 {
            return Err(ConfigError::Invalid("arxiv.limit must be > 0".into()));
        }
        if self.arxiv.keywords.is_empty() {
            return Err(ConfigError::Invalid("arxiv.keywords must not be empty".into()));
        }
        if !self.mail.dry_run {
            let mut missing = Vec::new();
            if self.mail.smtp_host.is_none() {
                missing.push("mail.smtp_host");
            }
            if self.mail.smtp_port == 0 {
                missing.push("mail.smtp_port");
            }
            if self.mail.smtp_user.is_none() {
                missing.push("mail.smtp_user");
            }
            if self.mail.smtp_pass.is_none() {
                missing.push("mail.smtp_pass");
            }
            if self.mail.from.is_none() {
                missing.push("mail.from");
            }
            if self.mail.to.is_empty() {
                missing.push("mail.to");
            }
            if !missing.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "missing settings outside dry_run: {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn env_source() -> ::config::Environment {
    ::config::Environment::with_prefix("DIGEST")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("arxiv.categories")
        .with_list_parse_key("arxiv.keywords")
        .with_list_parse_key("arxiv.title_terms")
        .with_list_parse_key("mail.to")
        .try_parsing(true)
}

/// 从 config 目录加载配置，环境变量 DIGEST__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 DIGEST__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut builder = ::config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(::config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(::config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {:?} not found, ignoring", path);
        }
    }

    builder = builder.add_source(env_source());

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    Ok(cfg.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(s: &str) -> AppConfig {
        let cfg: AppConfig = ::config::Config::builder()
            .add_source(::config::File::from_str(s, ::config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        cfg.normalize()
    }

    #[test]
    fn test_defaults() {
        let cfg = from_toml("");
        assert_eq!(cfg.arxiv.categories, vec!["cs.AI", "cs.LG", "stat.ML"]);
        assert_eq!(cfg.arxiv.since_hours, 24);
        assert_eq!(cfg.arxiv.limit, 50);
        assert_eq!(cfg.arxiv.min_score, 1);
        assert!(cfg.arxiv.keywords.contains(&"rlhf".to_string()));
        assert_eq!(cfg.state.path, PathBuf::from("data/state.json"));
        assert!(!cfg.state.resend_on_update);
        assert_eq!(cfg.llm.model, "deepseek-chat");
        assert_eq!(cfg.llm.temperature, 0.2);
        assert_eq!(cfg.mail.smtp_port, 587);
        assert!(cfg.mail.starttls);
        assert_eq!(cfg.render.subject_prefix, "[arXiv日报]");
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let cfg = from_toml(
            r#"
            [state]
            resend_on_update = true

            [arxiv]
            keywords = ["agent", "  ", "alignment"]
            since_hours = 48

            [mail]
            to = ["a@example.com"]
            "#,
        );
        assert!(cfg.state.resend_on_update);
        assert_eq!(cfg.state.path, PathBuf::from("data/state.json"));
        assert_eq!(cfg.arxiv.keywords, vec!["agent", "alignment"]);
        assert_eq!(cfg.arxiv.since_hours, 48);
        assert_eq!(cfg.arxiv.limit, 50);
        assert_eq!(cfg.mail.to, vec!["a@example.com"]);
        assert_eq!(cfg.mail.smtp_port, 587);
    }

    #[test]
    fn test_validate_lists_missing_smtp_settings() {
        let mut cfg = from_toml("[mail]\nsmtp_host = \"smtp.example.com\"\nsmtp_pass = \"x\"");
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("mail.smtp_user"));
        assert!(err.contains("mail.from"));
        assert!(err.contains("mail.to"));
        assert!(!err.contains("mail.smtp_host"));

        cfg.mail.dry_run = true;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut cfg = from_toml("[mail]\ndry_run = true");
        cfg.arxiv.keywords.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_window() {
        let mut cfg = from_toml("[mail]\ndry_run = true");
        cfg.arxiv.since_hours = u32::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        cfg.arxiv.since_hours = 24 * 365;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_timezone_fallback() {
        let mut render = RenderSection::default();
        assert_eq!(render.tz(), chrono_tz::Asia::Shanghai);
        render.timezone = "Mars/Olympus".into();
        assert_eq!(render.tz(), chrono_tz::UTC);
    }
}
