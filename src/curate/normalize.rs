// src/curate/normalize.rs
//! Raw per-source text → discrete item lines for scoring.
//!
//! Structured sources arrive as dash-prefixed lines; unstructured newsletter
//! prose becomes a single pseudo-item. Both caps here are token-budget
//! safeguards, not relevance decisions.

use std::collections::BTreeMap;

use crate::sources::truncate_chars;

/// Structured sources keep at most this many lines, first-come.
pub const ITEMS_PER_SOURCE: usize = 15;
/// Unstructured prose is folded into one pseudo-item of at most this size.
pub const PROSE_ITEM_BUDGET: usize = 800;

/// Itemize every source with content. Sources that produce no items are
/// dropped entirely; an empty map means there is nothing to curate.
pub fn itemize(raw: &BTreeMap<String, String>) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    for (key, text) in raw {
        let items = itemize_one(text);
        if !items.is_empty() {
            out.insert(key.clone(), items);
        }
    }
    out
}

pub fn itemize_one(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('-'))
        .map(str::to_string)
        .collect();
    if !lines.is_empty() {
        lines.truncate(ITEMS_PER_SOURCE);
        return lines;
    }

    // Unstructured prose (newsletter body). Leading '[' marks an error
    // placeholder, which is not content.
    if !text.starts_with('[') {
        return vec![truncate_chars(text, PROSE_ITEM_BUDGET)];
    }

    Vec::new()
}
