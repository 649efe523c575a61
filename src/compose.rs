// src/compose.rs
//! Editorial composition: a short intro highlighting the day's theme, and one
//! summary per source grouped by relevance tier.
//!
//! Summaries are issued one at a time with an inter-call delay to stay under
//! provider rate limits. A failed summary surfaces as a visible marker in its
//! own section and never blocks the others.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::curate::{ScoredItem, Tier};
use crate::llm::DynLlmClient;
use crate::profile::UserProfile;
use crate::sources::{truncate_chars, SourceCatalog, SourceKind};
use crate::today_str;

pub const SYSTEM_EDITOR: &str = "You are a concise, friendly assistant writing a personal morning digest. \
Write in plain English. No hype, no filler. Be direct and specific. \
Use bullet points. Do not exceed the requested length.";

const INTRO_MAX_TOKENS: u32 = 150;
const SECTION_MAX_TOKENS: u32 = 400;
const INTRO_TOP_ITEMS: usize = 6;
const RAW_CONTEXT_BUDGET: usize = 3000;

pub struct Composer {
    llm: DynLlmClient,
    delay: Duration,
}

impl Composer {
    pub fn new(llm: DynLlmClient) -> Self {
        Self {
            llm,
            delay: Duration::from_secs(3),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 2-3 sentence intro built from the day's high-tier items. Empty when
    /// there is nothing high-tier or the call fails.
    pub async fn editorial_intro(
        &self,
        catalog: &SourceCatalog,
        curated: &BTreeMap<String, Vec<ScoredItem>>,
        profile: &UserProfile,
    ) -> String {
        let mut top_items = Vec::new();
        for spec in &catalog.sources {
            let Some(items) = curated.get(&spec.key) else {
                continue;
            };
            for item in items {
                if item.tier == Tier::High {
                    top_items.push(format!(
                        "- [{}] {} (score: {:.2})",
                        spec.label, item.title, item.score
                    ));
                }
            }
        }
        if top_items.is_empty() {
            return String::new();
        }
        top_items.truncate(INTRO_TOP_ITEMS);

        let interests = profile
            .interests
            .high_priority
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Today is {}. Here are today's most relevant items for {}, a {} interested in {}:\n\n{}\n\n\
             Write a 2-3 sentence editorial intro for the morning digest. \
             Highlight the most important theme or story of the day. \
             Be direct and specific. No filler phrases like 'Good morning' or 'Here's your digest'.",
            today_str(),
            profile.user.name,
            profile.user.role,
            interests,
            top_items.join("\n"),
        );

        match self.llm.complete(SYSTEM_EDITOR, &prompt, INTRO_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = ?e, "editorial intro failed, continuing without one");
                String::new()
            }
        }
    }

    /// Summarise one source's curated items. High tier gets fuller context,
    /// medium gets one-liners, low gets headline+link only.
    pub async fn summarise_section(
        &self,
        spec: &crate::sources::SourceSpec,
        items: &[ScoredItem],
        raw_text: &str,
    ) -> String {
        if items.is_empty() {
            return String::new();
        }

        let titles = |tier: Tier| -> Vec<&str> {
            items
                .iter()
                .filter(|i| i.tier == tier)
                .map(|i| i.title.as_str())
                .collect()
        };
        let high = titles(Tier::High);
        let medium = titles(Tier::Medium);
        let low = titles(Tier::Low);

        let mut tiers_desc = String::new();
        if !high.is_empty() {
            tiers_desc.push_str(&format!(
                "High-relevance items (write 2-3 sentences each with context on why it matters): {high:?}\n"
            ));
        }
        if !medium.is_empty() {
            tiers_desc.push_str(&format!("Medium-relevance items (one sentence each): {medium:?}\n"));
        }
        if !low.is_empty() {
            tiers_desc.push_str(&format!(
                "Low-relevance items (headline + link only, no summary): {low:?}\n"
            ));
        }

        // Newsletter bodies carry the context the item lines lack.
        let is_newsletter = matches!(spec.kind, SourceKind::Newsletter { .. });
        let content_for_llm = if is_newsletter && !raw_text.is_empty() {
            truncate_chars(raw_text, RAW_CONTEXT_BUDGET)
        } else {
            items
                .iter()
                .map(|i| format!("- {} {}", i.title, i.url))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Summarise the following content from {}.\n\
             Format by relevance tier:\n{}\n\
             Use bullet points. Include URLs where available.\n\n\
             Content:\n{}",
            spec.label, tiers_desc, content_for_llm,
        );

        match self.llm.complete(SYSTEM_EDITOR, &prompt, SECTION_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = ?e, source = %spec.key, "section summary failed");
                format!("[Summary unavailable: {e:#}]")
            }
        }
    }

    /// Intro plus one summary per catalog source, in catalog order, with the
    /// configured delay between calls.
    pub async fn summarise_all(
        &self,
        catalog: &SourceCatalog,
        curated: &BTreeMap<String, Vec<ScoredItem>>,
        raw: &BTreeMap<String, String>,
        profile: &UserProfile,
    ) -> (BTreeMap<String, String>, String) {
        info!("generating editorial intro");
        let intro = self.editorial_intro(catalog, curated, profile).await;
        tokio::time::sleep(self.delay).await;

        let mut summaries = BTreeMap::new();
        for spec in &catalog.sources {
            let items = curated.get(&spec.key).map(Vec::as_slice).unwrap_or(&[]);
            if items.is_empty() {
                summaries.insert(spec.key.clone(), String::new());
                continue;
            }
            info!(source = %spec.key, items = items.len(), "summarising section");
            let raw_text = raw.get(&spec.key).map(String::as_str).unwrap_or("");
            let summary = self.summarise_section(spec, items, raw_text).await;
            summaries.insert(spec.key.clone(), summary);
            tokio::time::sleep(self.delay).await;
        }

        (summaries, intro)
    }
}
