// src/runlog.rs
//! Per-day run record: fetch statuses, curation stats, top items by score,
//! and the failed-source list, written as logs/YYYY-MM-DD.json.

use anyhow::{Context, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::curate::{CurationLog, ScoredItem, Tier};
use crate::sources::{FetchOutcome, FetchStatus};
use crate::today_iso;

pub const DEFAULT_LOGS_DIR: &str = "logs";

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub date: String,
    pub model: String,
    pub fetch: BTreeMap<String, FetchStatus>,
    pub curation: CurationLog,
    pub top_3_items: Vec<TopItem>,
    pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopItem {
    pub source: String,
    pub title: String,
    pub score: f32,
    pub tier: Tier,
}

impl RunRecord {
    pub fn new(
        model: impl Into<String>,
        fetch: BTreeMap<String, FetchStatus>,
        curation: CurationLog,
        curated: &BTreeMap<String, Vec<ScoredItem>>,
    ) -> Self {
        let failed_sources = failed_sources(&fetch);
        Self {
            date: today_iso(),
            model: model.into(),
            fetch,
            curation,
            top_3_items: top_items(curated, 3),
            failed_sources,
        }
    }

    /// Write `<dir>/<date>.json` atomically (tmp + rename).
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating logs dir {}", dir.display()))?;
        let path = dir.join(format!("{}.json", self.date));
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(self).context("serializing run record")?;
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes()).context("writing run record")?;
        fs::rename(&tmp, &path).context("publishing run record")?;
        Ok(path)
    }
}

/// Highest-scoring items across all sources, capped at `n`.
pub fn top_items(curated: &BTreeMap<String, Vec<ScoredItem>>, n: usize) -> Vec<TopItem> {
    let mut all: Vec<TopItem> = curated
        .iter()
        .flat_map(|(source, items)| {
            items.iter().map(move |item| TopItem {
                source: source.clone(),
                title: item.title.clone(),
                score: item.score,
                tier: item.tier,
            })
        })
        .collect();
    all.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    all.truncate(n);
    all
}

pub fn failed_sources(fetch: &BTreeMap<String, FetchStatus>) -> Vec<String> {
    fetch
        .iter()
        .filter(|(_, st)| st.status == FetchOutcome::Failed)
        .map(|(k, _)| k.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, score: f32) -> ScoredItem {
        ScoredItem {
            index: 0,
            title: title.to_string(),
            url: String::new(),
            score,
            tier: Tier::for_score(score),
            category: String::new(),
            rationale: String::new(),
        }
    }

    #[test]
    fn top_items_are_global_and_capped() {
        let mut curated = BTreeMap::new();
        curated.insert("a".to_string(), vec![item("a1", 0.7), item("a2", 0.95)]);
        curated.insert("b".to_string(), vec![item("b1", 0.9), item("b2", 0.3)]);

        let top = top_items(&curated, 3);
        let titles: Vec<&str> = top.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a2", "b1", "a1"]);
    }

    #[test]
    fn failed_sources_come_from_fetch_statuses() {
        let mut fetch = BTreeMap::new();
        fetch.insert(
            "ok".to_string(),
            FetchStatus {
                chars: 10,
                status: FetchOutcome::Ok,
                error: None,
            },
        );
        fetch.insert(
            "down".to_string(),
            FetchStatus {
                chars: 0,
                status: FetchOutcome::Failed,
                error: Some("timeout".to_string()),
            },
        );
        assert_eq!(failed_sources(&fetch), vec!["down".to_string()]);
    }

    #[test]
    fn record_writes_and_republishes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let mut curated = BTreeMap::new();
        curated.insert("a".to_string(), vec![item("a1", 0.9)]);

        let record = RunRecord::new(
            "claude-haiku-4-5",
            BTreeMap::new(),
            CurationLog::no_content(),
            &curated,
        );
        let path = record.write(dir.path()).expect("write run record");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let body: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(body["model"], "claude-haiku-4-5");
        assert_eq!(body["top_3_items"][0]["title"], "a1");
        assert_eq!(body["curation"]["error"], "No content to curate");
    }
}
