// tests/compose_stub.rs
//
// Composer behavior with stub LLM clients: sections render in catalog order,
// one failed summary never blocks the others, and the intro degrades to
// nothing rather than erroring.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use daily_digest::compose::Composer;
use daily_digest::llm::LlmClient;
use daily_digest::{ScoredItem, SourceCatalog, Tier, UserProfile};

struct FixedLlm {
    text: &'static str,
}

#[async_trait]
impl LlmClient for FixedLlm {
    async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        Ok(self.text.to_string())
    }
    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct BrokenLlm;

#[async_trait]
impl LlmClient for BrokenLlm {
    async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        Err(anyhow!("rate limited"))
    }
    fn model_name(&self) -> &str {
        "broken"
    }
}

fn catalog() -> SourceCatalog {
    SourceCatalog::from_toml_str(
        r#"
[[source]]
key = "simon"
label = "Simon Willison"
section = "AI News: Simon Willison"
kind = "rss"
url = "https://example.net/atom/"

[[source]]
key = "tldr"
label = "TLDR Newsletter"
section = "AI News: TLDR"
kind = "newsletter"
sender = "dan@tldrnewsletter.com"
subject = "TLDR"
"#,
    )
    .expect("test catalog")
}

fn profile() -> UserProfile {
    UserProfile::from_toml_str(
        r#"
[user]
name = "Sam"
role = "product engineer"

[interests]
high_priority = ["LLM tooling"]
medium_priority = ["startup funding"]
low_priority = ["SF events"]

[content_rules]
min_relevance_threshold = 0.6
always_include_sources = []
max_items_per_section = 3
"#,
    )
    .expect("test profile")
}

fn item(title: &str, score: f32) -> ScoredItem {
    ScoredItem {
        index: 1,
        title: title.to_string(),
        url: "https://example.net/p".to_string(),
        score,
        tier: Tier::for_score(score),
        category: String::new(),
        rationale: String::new(),
    }
}

#[tokio::test]
async fn sources_without_items_get_empty_summaries() {
    let composer =
        Composer::new(Arc::new(FixedLlm { text: "- summary" })).with_delay(Duration::ZERO);

    let mut curated = BTreeMap::new();
    curated.insert("simon".to_string(), vec![item("a post", 0.9)]);

    let raw = BTreeMap::new();
    let (summaries, intro) = composer
        .summarise_all(&catalog(), &curated, &raw, &profile())
        .await;

    assert_eq!(summaries["simon"], "- summary");
    assert_eq!(summaries["tldr"], "");
    assert_eq!(intro, "- summary");
}

#[tokio::test]
async fn failed_summaries_are_marked_but_do_not_abort() {
    let composer = Composer::new(Arc::new(BrokenLlm)).with_delay(Duration::ZERO);

    let mut curated = BTreeMap::new();
    curated.insert("simon".to_string(), vec![item("a post", 0.9)]);
    curated.insert("tldr".to_string(), vec![item("a newsletter", 0.7)]);

    let raw = BTreeMap::new();
    let (summaries, intro) = composer
        .summarise_all(&catalog(), &curated, &raw, &profile())
        .await;

    assert!(summaries["simon"].starts_with("[Summary unavailable:"));
    assert!(summaries["tldr"].starts_with("[Summary unavailable:"));
    assert_eq!(intro, "", "intro failure degrades to empty");
}

#[tokio::test]
async fn intro_is_empty_without_high_tier_items() {
    let composer =
        Composer::new(Arc::new(FixedLlm { text: "unused" })).with_delay(Duration::ZERO);

    let mut curated = BTreeMap::new();
    curated.insert("simon".to_string(), vec![item("meh", 0.65)]);

    let intro = composer
        .editorial_intro(&catalog(), &curated, &profile())
        .await;
    assert_eq!(intro, "");
}
