//! arxiv-digest 入口
//!
//! 初始化日志、加载并校验配置、执行一次日报流程；dry_run 时把渲染结果打印到标准输出。

use std::path::PathBuf;

use anyhow::Context;
use arxiv_digest::{config::load_config, observability, DigestRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    // 额外配置文件：ARXIV_DIGEST_CONFIG=path/to/config.toml
    let config_path = std::env::var_os("ARXIV_DIGEST_CONFIG").map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    cfg.validate().context("Invalid config")?;

    tracing::info!(
        "Config loaded: categories={:?} keywords={} since_hours={} limit={} state={:?} resend_on_update={} dry_run={} llm={}",
        cfg.arxiv.categories,
        cfg.arxiv.keywords.len(),
        cfg.arxiv.since_hours,
        cfg.arxiv.limit,
        cfg.state.path,
        cfg.state.resend_on_update,
        cfg.mail.dry_run,
        if cfg.llm.api_key.is_some() { cfg.llm.model.as_str() } else { "disabled" },
    );

    let dry_run = cfg.mail.dry_run;
    let runner = DigestRunner::from_config(cfg).context("Failed to initialize digest runner")?;
    let report = runner.run().await.context("Digest run failed")?;

    if dry_run {
        let rule = "=".repeat(80);
        println!("\n{}\n", rule);
        println!("{}", report.email.text);
        println!("\n{}\n", rule);
        println!("[dry_run] html_size={} bytes", report.email.html.len());
    }

    tracing::info!(
        "Done: fetched={} matched={} sent={} summarized={} failed={} delivered={} state_saved={}",
        report.fetched,
        report.matched,
        report.to_send.len(),
        report.summarized,
        report.failed.len(),
        report.delivered,
        report.state_saved
    );
    Ok(())
}
