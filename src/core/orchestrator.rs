//! 日报编排器：单次批处理
//!
//! 抓取 → 打分筛选 → 按状态判定待推送 → （可选）逐篇总结 → 渲染 → 投递 → 投递成功后 mark_sent + save。
//! 全程顺序执行；StateStore 由本次运行独占。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::config::AppConfig;
use crate::core::{DigestError, RetryConfig};
use crate::feed::{ArxivClient, FeedQuery, FeedSource};
use crate::filter::{filter_papers, FilterResult};
use crate::llm::{create_llm_from_config, LlmClient};
use crate::mail::{Mailer, SmtpMailer, SmtpSettings};
use crate::render::{render_email, RenderItem, RenderedEmail};
use crate::state::StateStore;
use crate::summarizer::Summarizer;

/// 一次运行的结果摘要
#[derive(Debug, Clone)]
pub struct RunReport {
    pub fetched: usize,
    pub matched: usize,
    /// 本次判定需要推送的论文（带版本号的 id）
    pub to_send: Vec<String>,
    pub summarized: usize,
    /// 总结失败条目："<id> <title> (<error>)"
    pub failed: Vec<String>,
    pub email: RenderedEmail,
    pub delivered: bool,
    pub state_saved: bool,
}

pub struct DigestRunner {
    cfg: AppConfig,
    feed: Arc<dyn FeedSource>,
    llm: Option<Arc<dyn LlmClient>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl DigestRunner {
    pub fn new(
        cfg: AppConfig,
        feed: Arc<dyn FeedSource>,
        llm: Option<Arc<dyn LlmClient>>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            cfg,
            feed,
            llm,
            mailer,
        }
    }

    /// 按配置创建 arXiv 客户端、LLM（有 API Key 时）与 SMTP 发信器（非 dry_run 时）
    pub fn from_config(cfg: AppConfig) -> Result<Self, DigestError> {
        let feed = ArxivClient::new(cfg.arxiv.base_url.as_deref(), cfg.arxiv.timeout_secs)?;
        let llm = create_llm_from_config(&cfg.llm);
        let mailer: Option<Arc<dyn Mailer>> = if cfg.mail.dry_run {
            None
        } else {
            let settings = SmtpSettings::from_config(&cfg.mail).ok_or_else(|| {
                crate::config::ConfigError::Invalid("incomplete SMTP settings".into())
            })?;
            let retry = RetryConfig::default().with_max_attempts(cfg.mail.max_retries);
            Some(Arc::new(SmtpMailer::new(settings, retry)))
        };
        Ok(Self::new(cfg, Arc::new(feed), llm, mailer))
    }

    fn query(&self) -> FeedQuery {
        FeedQuery {
            categories: self.cfg.arxiv.categories.clone(),
            title_terms: self.cfg.arxiv.title_terms.clone(),
            since_hours: self.cfg.arxiv.since_hours,
            max_results: self.cfg.arxiv.limit,
        }
    }

    /// 逐篇总结；失败只记录，不中断
    async fn summarize(
        &self,
        to_process: &[FilterResult],
    ) -> (HashMap<String, String>, Vec<String>) {
        let mut summaries = HashMap::new();
        let mut failed = Vec::new();
        let Some(client) = self.llm.clone() else {
            tracing::info!("No LLM API key configured; skip summarization");
            return (summaries, failed);
        };
        if to_process.is_empty() {
            return (summaries, failed);
        }

        let summarizer = Summarizer::new(client);
        let total = to_process.len();
        for (idx, r) in to_process.iter().enumerate() {
            let p = &r.paper;
            tracing::info!("Summarizing {}/{}: {}", idx + 1, total, p.arxiv_id);
            match summarizer.summarize_one(p, &r.matched_keywords).await {
                Ok(text) => {
                    summaries.insert(p.arxiv_id.clone(), text);
                }
                Err(e) => {
                    tracing::warn!("Summarization failed for {}: {}", p.arxiv_id, e);
                    failed.push(format!("{} {} ({})", p.arxiv_id, p.title, e));
                }
            }
        }
        let (prompt, completion, total_tokens) = summarizer.token_usage();
        tracing::debug!(
            "LLM token usage: prompt={} completion={} total={}",
            prompt,
            completion,
            total_tokens
        );
        (summaries, failed)
    }

    pub async fn run(&self) -> Result<RunReport, DigestError> {
        let cfg = &self.cfg;

        let papers = self.feed.fetch_recent(&self.query()).await?;
        let fetched = papers.len();
        tracing::info!(
            "Fetched {} entries updated in the last {}h (limit={})",
            fetched,
            cfg.arxiv.since_hours,
            cfg.arxiv.limit
        );

        let filtered = filter_papers(papers, &cfg.arxiv.keywords, cfg.arxiv.min_score);
        let matched = filtered.len();
        tracing::info!("Matched {} entries (min_score={})", matched, cfg.arxiv.min_score);

        let mut state = StateStore::load(&cfg.state.path)?;
        let resend = cfg.state.resend_on_update;
        let to_process: Vec<FilterResult> = filtered
            .into_iter()
            .filter(|r| state.should_send(&r.paper.arxiv_id, r.paper.updated, resend))
            .collect();
        tracing::info!(
            "To send {} / {} (resend_on_update={})",
            to_process.len(),
            matched,
            resend
        );

        let (mut summaries, failed) = self.summarize(&to_process).await;
        let summarized = summaries.len();

        let date_local = Utc::now()
            .with_timezone(&cfg.render.tz())
            .format("%Y-%m-%d")
            .to_string();
        let items: Vec<RenderItem> = to_process
            .iter()
            .map(|r| {
                let p = &r.paper;
                RenderItem {
                    title: p.title.clone(),
                    arxiv_id: p.arxiv_id.clone(),
                    link_abs: p.link_abs.clone(),
                    authors: p.authors.clone(),
                    categories: p.categories.clone(),
                    updated_iso: p.updated.to_rfc3339(),
                    matched_keywords: r.matched_keywords.clone(),
                    abstract_text: p.summary.clone(),
                    summary_md: summaries.remove(&p.arxiv_id),
                    score: r.score,
                }
            })
            .collect();
        let email = render_email(&cfg.render.subject_prefix, &date_local, &items, &failed);

        let mut report = RunReport {
            fetched,
            matched,
            to_send: to_process.iter().map(|r| r.paper.arxiv_id.clone()).collect(),
            summarized,
            failed,
            email,
            delivered: false,
            state_saved: false,
        };

        if cfg.mail.dry_run {
            tracing::info!("Dry run: not sending email, not updating state");
            return Ok(report);
        }
        if cfg.mail.skip_empty && to_process.is_empty() {
            tracing::info!("Nothing new to send; skipping delivery");
            return Ok(report);
        }

        let mailer = self.mailer.as_ref().ok_or_else(|| {
            crate::config::ConfigError::Invalid("no mailer configured outside dry_run".into())
        })?;
        let from = cfg
            .mail
            .from
            .as_deref()
            .ok_or_else(|| crate::config::ConfigError::Invalid("mail.from is not set".into()))?;
        mailer.send(from, &cfg.mail.to, &report.email).await?;
        report.delivered = true;
        tracing::info!("Mail sent to {} recipient(s)", cfg.mail.to.len());

        // 只有投递成功后才更新状态
        for r in &to_process {
            state.mark_sent(&r.paper.arxiv_id, r.paper.updated);
        }
        state.save()?;
        report.state_saved = true;
        tracing::info!("State saved: {:?}", state.path());

        Ok(report)
    }
}
