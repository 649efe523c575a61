// src/curate/mod.rs
//! Curation pipeline: itemize raw source text, score everything against the
//! user profile in one batched LLM exchange, then filter/rank/cap per source.
//!
//! Scoring failure never aborts a run; it degrades to an include-all result
//! so there is always something to summarise and send. The three terminal
//! states (scored / no content / degraded) are explicit `CurationLog`
//! branches, not exceptions.

pub mod normalize;
pub mod prompt;
pub mod response;

pub use response::{ScoredItem, Tier};

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::llm::DynLlmClient;
use crate::profile::UserProfile;
use crate::sources::truncate_chars;

pub const NO_CONTENT_MARKER: &str = "No content to curate";

const SCORING_MAX_TOKENS: u32 = 2500;
const FALLBACK_TITLE_BUDGET: usize = 200;

/// Per-source filter accounting for the run log.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SourceStats {
    pub total_scored: usize,
    pub passed_filter: usize,
}

/// Outcome of a curation run. Serialized untagged so the run log carries
/// either per-source stats, `{"error": ...}` for an empty run, or
/// `{"error": ..., "fallback": true}` for a degraded one.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CurationLog {
    Stats(BTreeMap<String, SourceStats>),
    NoContent { error: String },
    Degraded { error: String, fallback: bool },
}

impl CurationLog {
    pub fn no_content() -> Self {
        CurationLog::NoContent {
            error: NO_CONTENT_MARKER.to_string(),
        }
    }

    pub fn degraded(error: impl Into<String>) -> Self {
        CurationLog::Degraded {
            error: error.into(),
            fallback: true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CurationLog::Degraded { fallback: true, .. })
    }

    pub fn stats(&self) -> Option<&BTreeMap<String, SourceStats>> {
        match self {
            CurationLog::Stats(s) => Some(s),
            _ => None,
        }
    }
}

pub struct Curator {
    llm: DynLlmClient,
    /// source_key -> display label, for the scoring prompt.
    labels: BTreeMap<String, String>,
}

impl Curator {
    pub fn new(llm: DynLlmClient, labels: BTreeMap<String, String>) -> Self {
        Self { llm, labels }
    }

    /// Score, filter, rank, and cap everything in `raw` against `profile`.
    ///
    /// Pure given its inputs apart from the single scoring exchange; all
    /// failure modes come back as data, never as an error.
    pub async fn curate(
        &self,
        raw: &BTreeMap<String, String>,
        profile: &UserProfile,
    ) -> (BTreeMap<String, Vec<ScoredItem>>, CurationLog) {
        let items_by_source = normalize::itemize(raw);
        if items_by_source.is_empty() {
            info!("nothing to curate across all sources");
            return (BTreeMap::new(), CurationLog::no_content());
        }

        let request = prompt::scoring_request(profile, &items_by_source, &self.labels);

        let response = match self
            .llm
            .complete(prompt::SYSTEM_CURATOR, &request, SCORING_MAX_TOKENS)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, "scoring call failed, falling back to include-all mode");
                return self.fallback(raw, format!("{e:#}"));
            }
        };

        let scored = match response::parse_scored(&response) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = ?e, "scoring response unusable, falling back to include-all mode");
                return self.fallback(raw, format!("{e:#}"));
            }
        };

        let rules = &profile.content_rules;
        let mut curated = BTreeMap::new();
        let mut stats = BTreeMap::new();
        for (source_key, returned) in scored {
            // Keys we never asked about are skipped, not errors.
            if !items_by_source.contains_key(&source_key) {
                debug!(source = %source_key, "ignoring unrecognized source in scoring response");
                continue;
            }
            let always = profile.is_always_included(&source_key);
            let (kept, source_stats) = apply_policy(
                returned,
                always,
                rules.min_relevance_threshold,
                rules.max_items_per_section,
            );
            stats.insert(source_key.clone(), source_stats);
            curated.insert(source_key, kept);
        }

        (curated, CurationLog::Stats(stats))
    }

    /// Include-all degradation: one synthesized item per source with content,
    /// so the digest still ships when scoring is unavailable.
    fn fallback(
        &self,
        raw: &BTreeMap<String, String>,
        error: String,
    ) -> (BTreeMap<String, Vec<ScoredItem>>, CurationLog) {
        let mut curated = BTreeMap::new();
        for (key, text) in raw {
            if text.is_empty() {
                continue;
            }
            curated.insert(
                key.clone(),
                vec![ScoredItem {
                    index: 1,
                    title: truncate_chars(text, FALLBACK_TITLE_BUDGET),
                    url: String::new(),
                    score: 1.0,
                    tier: Tier::High,
                    category: "fallback".to_string(),
                    rationale: "scoring unavailable".to_string(),
                }],
            );
        }
        (curated, CurationLog::degraded(error))
    }
}

/// Threshold filter (waived for always-include sources), stable sort by score
/// descending, then per-section cap.
fn apply_policy(
    returned: Vec<ScoredItem>,
    always_include: bool,
    threshold: f32,
    max_items: usize,
) -> (Vec<ScoredItem>, SourceStats) {
    let total_scored = returned.len();

    let mut kept: Vec<ScoredItem> = returned
        .into_iter()
        .filter(|item| always_include || item.score >= threshold)
        .collect();
    kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    kept.truncate(max_items);

    let stats = SourceStats {
        total_scored,
        passed_filter: kept.len(),
    };
    (kept, stats)
}
