//! Daily digest — binary entrypoint.
//! One run: fetch → curate → summarise → format → send → log.
//!
//! See `README.md` for configuration and `config/` for the profile, source
//! catalog, and LLM settings.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_digest::compose::Composer;
use daily_digest::curate::Curator;
use daily_digest::deliver::Mailer;
use daily_digest::llm::{build_client_from_config, LlmConfig};
use daily_digest::profile::UserProfile;
use daily_digest::runlog::{self, RunRecord};
use daily_digest::sources::{self, MailboxConfig, SourceCatalog};
use daily_digest::{render, today_iso, today_str};

#[derive(Parser, Debug)]
#[command(name = "daily-digest", about = "Build and send the personal morning digest")]
struct Cli {
    /// Run the full pipeline but save the HTML to a file instead of sending.
    #[arg(long)]
    dry_run: bool,

    /// Score a small synthetic batch to verify LLM scoring works, then exit.
    #[arg(long)]
    test_curation: bool,

    /// Directory for per-run JSON records.
    #[arg(long, default_value = runlog::DEFAULT_LOGS_DIR)]
    logs_dir: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_digest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in CI where secrets come from the runner.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    // Configuration problems should stop the run here, before any fetching.
    let profile = UserProfile::load_default().context("loading user profile")?;
    let catalog = SourceCatalog::load_default().context("loading source catalog")?;
    let llm_cfg = LlmConfig::load_default().context("loading llm config")?;
    let client = build_client_from_config(&llm_cfg);
    let curator = Curator::new(client.clone(), catalog.labels());

    if cli.test_curation {
        return test_curation(&curator, &profile).await;
    }

    run(&cli, &profile, &catalog, &curator, client).await
}

async fn run(
    cli: &Cli,
    profile: &UserProfile,
    catalog: &SourceCatalog,
    curator: &Curator,
    client: daily_digest::DynLlmClient,
) -> Result<()> {
    info!("building digest for {}", today_str());

    let mailer = if cli.dry_run {
        None
    } else {
        Some(Mailer::from_env().context("configuring delivery transport")?)
    };

    // 1. FETCH
    let mailbox = if catalog.needs_mailbox() {
        Some(MailboxConfig::from_env().context("configuring IMAP mailbox")?)
    } else {
        None
    };
    let providers = sources::build_providers(catalog, mailbox)?;
    let (raw, fetch_log) = sources::collect(&providers).await;
    for (key, st) in &fetch_log {
        info!(
            source = %key,
            chars = st.chars,
            status = ?st.status,
            error = st.error.as_deref().unwrap_or(""),
            "fetched"
        );
    }

    // 2. CURATE: one batched scoring call across all sources
    let (curated, curation_log) = curator.curate(&raw, profile).await;
    if let Some(stats) = curation_log.stats() {
        for (key, st) in stats {
            info!(source = %key, "{}/{} items passed filter", st.passed_filter, st.total_scored);
        }
    }
    if cli.dry_run {
        print_scores(&curated);
    }

    // 3. SUMMARISE: editorial voice, one call per source + intro
    let model = client.model_name().to_string();
    let composer = Composer::new(client);
    let (summaries, intro) = composer.summarise_all(catalog, &curated, &raw, profile).await;
    if cli.dry_run {
        print_summaries(&intro, &summaries);
    }

    // 4. FORMAT + SEND
    let failed = runlog::failed_sources(&fetch_log);
    let html = render::build_html(catalog, &summaries, &intro, &failed);
    let subject = format!("Your Daily Digest — {}", today_str());

    match mailer {
        None => {
            let out_path = PathBuf::from(format!("dry-run-{}.html", today_iso()));
            std::fs::write(&out_path, &html)
                .with_context(|| format!("saving {}", out_path.display()))?;
            info!(path = %out_path.display(), "dry run: email not sent, HTML saved");
        }
        Some(mailer) => {
            mailer.send(&subject, &html).await.context("sending digest")?;
        }
    }

    // 5. LOG
    let record = RunRecord::new(model, fetch_log, curation_log, &curated);
    let path = record.write(&cli.logs_dir)?;
    info!(path = %path.display(), "run record written");

    Ok(())
}

fn print_scores(curated: &std::collections::BTreeMap<String, Vec<daily_digest::ScoredItem>>) {
    println!("\n--- CURATION SCORES (dry run) ---");
    for (source_key, items) in curated {
        if items.is_empty() {
            continue;
        }
        println!("{source_key}:");
        for item in items {
            let bar = "█".repeat((item.score * 10.0) as usize);
            let title: String = item.title.chars().take(80).collect();
            println!("  [{:.2}] {:10} [{:?}] {}", item.score, bar, item.tier, title);
        }
    }
}

fn print_summaries(intro: &str, summaries: &std::collections::BTreeMap<String, String>) {
    println!("\n--- EDITORIAL INTRO (dry run) ---");
    println!("{intro}\n");
    println!("--- SECTION SUMMARIES (dry run) ---");
    for (key, summary) in summaries {
        if summary.is_empty() {
            continue;
        }
        let excerpt: String = summary.chars().take(300).collect();
        println!("\n[{key}]\n{excerpt}");
    }
}

/// Verify the scoring call works using a tiny synthetic dataset: one LLM call
/// with a mix of clearly relevant and clearly irrelevant items.
async fn test_curation(curator: &Curator, profile: &UserProfile) -> Result<()> {
    println!("Testing curation scoring with synthetic items...");

    let mut fake_raw = std::collections::BTreeMap::new();
    fake_raw.insert(
        "simon".to_string(),
        "- Claude Code adds multi-agent orchestration support: https://simonwillison.net/2026/agent-arch/\n\
         - Notes on building LLM-powered developer tools: https://simonwillison.net/2026/llm-tools/\n"
            .to_string(),
    );
    fake_raw.insert(
        "techcrunch".to_string(),
        "- AI agent startup raises $200M to automate enterprise workflows: https://techcrunch.com/ai-agent-series-c/\n\
         - Celebrity chef opens new restaurant in Miami: https://techcrunch.com/miami-restaurant/\n"
            .to_string(),
    );
    fake_raw.insert(
        "funcheap".to_string(),
        "- Free jazz concert in Dolores Park this Sunday: https://sf.funcheap.com/jazz/\n\
         - Celebrity gossip roundup — who wore it best?: https://sf.funcheap.com/celeb/\n"
            .to_string(),
    );

    let (curated, curation_log) = curator.curate(&fake_raw, profile).await;

    if curation_log.is_fallback() {
        println!("\n[FAIL] Curation fell back to include-all mode.");
        if let daily_digest::CurationLog::Degraded { error, .. } = &curation_log {
            println!("  Error: {error}");
        }
        println!("\n  This means the LLM scoring call failed (likely rate limit or model error).");
        println!("  Try again in a few minutes.");
        return Ok(());
    }

    println!("\n[PASS] Curation scoring succeeded!\n");
    println!("Scores by source:");
    for (source_key, items) in &curated {
        println!("\n  {source_key}:");
        for item in items {
            let bar = "█".repeat((item.score * 10.0) as usize);
            let title: String = item.title.chars().take(70).collect();
            println!("    [{:.2}] {:10} [{:?}] {}", item.score, bar, item.tier, title);
            if !item.rationale.is_empty() {
                println!("           → {}", item.rationale);
            }
        }
    }

    if let Some(stats) = curation_log.stats() {
        println!("\nFilter stats:");
        for (src, st) in stats {
            println!("  {src}: {}/{} items passed", st.passed_filter, st.total_scored);
        }
    }

    println!("\nSanity check:");
    println!("  High-relevance items should include: AI/LLM/agent stories");
    println!("  Low-relevance items should score below 0.6 (or be filtered out)");
    Ok(())
}
