// src/curate/response.rs
//! Defensive adapter for the scoring response. The model is an untyped
//! boundary: everything shape-related (fencing, missing fields, out-of-band
//! scores, misassigned tiers) is absorbed here so the policy code can trust
//! its input.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredItem {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Low
    }
}

// Tolerant by hand: unknown tier strings land in Low and get rebanded from
// the score right after parsing.
impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D>(deserializer: D) -> Result<Tier, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "high" => Tier::High,
            "medium" => Tier::Medium,
            _ => Tier::Low,
        })
    }
}

impl Tier {
    /// Fixed score bands: high >= 0.8, medium 0.6-0.79, low below.
    pub fn for_score(score: f32) -> Tier {
        if score >= 0.8 {
            Tier::High
        } else if score >= 0.6 {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

/// Strip optional triple-backtick fencing (with or without a `json` hint).
pub fn strip_code_fences(s: &str) -> String {
    static RE_OPEN: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_open = RE_OPEN.get_or_init(|| regex::Regex::new(r"^```(?:json)?\s*").unwrap());
    static RE_CLOSE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_close = RE_CLOSE.get_or_init(|| regex::Regex::new(r"\s*```$").unwrap());

    let trimmed = s.trim();
    let opened = re_open.replace(trimmed, "");
    re_close.replace(opened.trim(), "").trim().to_string()
}

/// Parse the model's response into per-source item lists. Scores are clamped
/// into [0, 1] and tiers recomputed from score when the model's assignment
/// falls outside the declared band.
pub fn parse_scored(response: &str) -> Result<BTreeMap<String, Vec<ScoredItem>>> {
    let cleaned = strip_code_fences(response);
    let mut parsed: BTreeMap<String, Vec<ScoredItem>> =
        serde_json::from_str(&cleaned).context("parsing scoring response json")?;

    for items in parsed.values_mut() {
        for item in items.iter_mut() {
            if !item.score.is_finite() {
                item.score = 0.0;
            }
            item.score = item.score.clamp(0.0, 1.0);
            let banded = Tier::for_score(item.score);
            if item.tier != banded {
                item.tier = banded;
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let scored = parse_scored(r#"{"simon":[{"title":"A post"}]}"#).expect("parse");
        let item = &scored["simon"][0];
        assert_eq!(item.title, "A post");
        assert_eq!(item.url, "");
        assert_eq!(item.score, 0.0);
        assert_eq!(item.tier, Tier::Low);
    }

    #[test]
    fn misassigned_tier_is_recomputed_from_score() {
        let scored = parse_scored(
            r#"{"simon":[
                {"title":"A","score":0.95,"tier":"low"},
                {"title":"B","score":0.65,"tier":"high"},
                {"title":"C","score":0.2,"tier":"high"}
            ]}"#,
        )
        .expect("parse");
        let tiers: Vec<Tier> = scored["simon"].iter().map(|i| i.tier).collect();
        assert_eq!(tiers, vec![Tier::High, Tier::Medium, Tier::Low]);
    }

    #[test]
    fn unknown_tier_strings_are_tolerated() {
        let scored =
            parse_scored(r#"{"simon":[{"title":"A","score":0.9,"tier":"critical"}]}"#).expect("parse");
        assert_eq!(scored["simon"][0].tier, Tier::High);
    }

    #[test]
    fn out_of_band_scores_are_clamped() {
        let scored = parse_scored(
            r#"{"simon":[{"title":"A","score":1.7},{"title":"B","score":-0.5}]}"#,
        )
        .expect("parse");
        assert_eq!(scored["simon"][0].score, 1.0);
        assert_eq!(scored["simon"][1].score, 0.0);
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(parse_scored("Sorry, I cannot help with that.").is_err());
    }
}
