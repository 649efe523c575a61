// src/curate/prompt.rs
//! Batched scoring request construction: one request covers every source so a
//! run costs a single scoring call.

use std::collections::BTreeMap;

use crate::profile::UserProfile;

pub const SYSTEM_CURATOR: &str = "You are an editorial AI assistant helping curate a personal morning digest. \
You will be given a user profile and a set of content items from various sources. \
Your job is to score each item for relevance to the user's interests and return structured JSON. \
Be strict: only high-quality, specific, relevant items should score above 0.7. \
General news filler, clickbait, or off-topic items should score below 0.5.";

pub fn profile_summary(profile: &UserProfile) -> String {
    format!(
        "User: {}, {}\n\
         High priority interests: {}\n\
         Medium priority interests: {}\n\
         Low priority interests: {}\n\
         Relevance threshold: {} (exclude anything below this)\n\
         Max items per source: {}\n",
        profile.user.name,
        profile.user.role,
        profile.interests.high_priority.join(", "),
        profile.interests.medium_priority.join(", "),
        profile.interests.low_priority.join(", "),
        profile.content_rules.min_relevance_threshold,
        profile.content_rules.max_items_per_section,
    )
}

/// Full user message: profile summary, the output contract, and the labeled
/// 1-indexed item lists for every source with content.
pub fn scoring_request(
    profile: &UserProfile,
    items_by_source: &BTreeMap<String, Vec<String>>,
    labels: &BTreeMap<String, String>,
) -> String {
    let mut items_text = String::new();
    for (source_key, lines) in items_by_source {
        let label = labels
            .get(source_key)
            .map(String::as_str)
            .unwrap_or(source_key);
        items_text.push_str(&format!("\n\n### Source: {source_key} ({label})\n"));
        for (i, line) in lines.iter().enumerate() {
            items_text.push_str(&format!("{}. {line}\n", i + 1));
        }
    }

    let threshold = profile.content_rules.min_relevance_threshold;
    let always_include = profile.content_rules.always_include_sources.join(", ");

    format!(
        r#"Given this user profile:
{profile_summary}

Score each item below for relevance (0.0-1.0) to this user's interests.
Return a JSON object with this exact structure:
{{
  "source_key": [
    {{
      "index": 1,
      "title": "item title or first 80 chars",
      "url": "url if present else empty string",
      "score": 0.85,
      "tier": "high",
      "category": "matching interest category",
      "rationale": "one sentence why"
    }}
  ]
}}

Tiers: "high" (score >= 0.8), "medium" (0.6-0.79), "low" ({threshold}-0.59).
Only include items that score >= {threshold}, EXCEPT for always-include sources ({always_include}) where include all items but still score them.
Return valid JSON only. No markdown, no explanation outside the JSON.

Items to score:
{items_text}"#,
        profile_summary = profile_summary(profile),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> UserProfile {
        UserProfile::from_toml_str(
            r#"
[user]
name = "Sam"
role = "product engineer"

[interests]
high_priority = ["LLM tooling", "AI agents"]
medium_priority = ["startup funding"]
low_priority = ["SF events"]

[content_rules]
min_relevance_threshold = 0.6
always_include_sources = ["simon"]
max_items_per_section = 3
"#,
        )
        .expect("test profile")
    }

    #[test]
    fn summary_lists_all_three_interest_tiers() {
        let s = profile_summary(&test_profile());
        assert!(s.contains("Sam, product engineer"));
        assert!(s.contains("High priority interests: LLM tooling, AI agents"));
        assert!(s.contains("Medium priority interests: startup funding"));
        assert!(s.contains("Low priority interests: SF events"));
        assert!(s.contains("Relevance threshold: 0.6"));
        assert!(s.contains("Max items per source: 3"));
    }

    #[test]
    fn request_labels_and_indexes_items() {
        let mut items = BTreeMap::new();
        items.insert(
            "simon".to_string(),
            vec!["- A post: https://a".to_string(), "- Another: https://b".to_string()],
        );
        let mut labels = BTreeMap::new();
        labels.insert("simon".to_string(), "Simon Willison".to_string());

        let req = scoring_request(&test_profile(), &items, &labels);
        assert!(req.contains("### Source: simon (Simon Willison)"));
        assert!(req.contains("1. - A post: https://a"));
        assert!(req.contains("2. - Another: https://b"));
        assert!(req.contains("always-include sources (simon)"));
        assert!(req.contains(r#""tier": "high""#));
    }

    #[test]
    fn unknown_labels_fall_back_to_the_key() {
        let mut items = BTreeMap::new();
        items.insert("mystery".to_string(), vec!["- X".to_string()]);
        let req = scoring_request(&test_profile(), &items, &BTreeMap::new());
        assert!(req.contains("### Source: mystery (mystery)"));
    }
}
