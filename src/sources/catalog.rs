// src/sources/catalog.rs
//! Declarative source catalog: which feeds, newsletters, and event pages make
//! up the digest, in email section order.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

pub const ENV_SOURCES_PATH: &str = "DIGEST_SOURCES_PATH";

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCatalog {
    #[serde(rename = "source")]
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub key: String,
    pub label: String,
    /// Email section heading, e.g. "AI News: Simon Willison".
    pub section: String,
    #[serde(default)]
    pub icon: String,
    #[serde(flatten)]
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Rss {
        url: String,
        /// Tried when the primary feed yields zero items.
        #[serde(default)]
        fallback_url: Option<String>,
        #[serde(default = "default_limit")]
        limit: usize,
        /// Include a short normalized summary line under each headline.
        #[serde(default)]
        with_summary: bool,
    },
    Newsletter {
        sender: String,
        subject: String,
    },
    Events {
        url: String,
        #[serde(default = "default_limit")]
        limit: usize,
    },
}

impl SourceCatalog {
    /// Load from a TOML file. Uses DIGEST_SOURCES_PATH or defaults to
    /// "config/sources.toml".
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_SOURCES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCES_PATH));
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading source catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let catalog: SourceCatalog =
            toml::from_str(toml_str).context("parsing source catalog")?;
        if catalog.sources.is_empty() {
            bail!("source catalog is empty");
        }
        let mut seen = std::collections::BTreeSet::new();
        for s in &catalog.sources {
            if s.key.trim().is_empty() {
                bail!("source with empty key in catalog");
            }
            if !seen.insert(s.key.as_str()) {
                bail!("duplicate source key in catalog: {}", s.key);
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, key: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.key == key)
    }

    /// source_key -> display label, for prompts and the email footer.
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.sources
            .iter()
            .map(|s| (s.key.clone(), s.label.clone()))
            .collect()
    }

    pub fn label_for(&self, key: &str) -> String {
        self.get(key)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| key.to_string())
    }

    /// True if any configured source needs IMAP credentials.
    pub fn needs_mailbox(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s.kind, SourceKind::Newsletter { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOML: &str = r#"
[[source]]
key = "simon"
label = "Simon Willison"
section = "AI News: Simon Willison"
icon = "🔬"
kind = "rss"
url = "https://example.net/atom/"
limit = 8
with_summary = true

[[source]]
key = "tldr"
label = "TLDR Newsletter"
section = "AI News: TLDR"
kind = "newsletter"
sender = "dan@tldrnewsletter.com"
subject = "TLDR"

[[source]]
key = "luma"
label = "Luma SF"
section = "SF Meetups: Luma"
icon = "🤝"
kind = "events"
url = "https://example.com/sf"
"#;

    #[test]
    fn parses_all_source_kinds() {
        let c = SourceCatalog::from_toml_str(TEST_TOML).expect("load test catalog");
        assert_eq!(c.sources.len(), 3);
        assert!(matches!(
            c.get("simon").unwrap().kind,
            SourceKind::Rss { with_summary: true, limit: 8, .. }
        ));
        assert!(matches!(c.get("tldr").unwrap().kind, SourceKind::Newsletter { .. }));
        assert!(matches!(c.get("luma").unwrap().kind, SourceKind::Events { limit: 10, .. }));
        assert!(c.needs_mailbox());
        assert_eq!(c.label_for("luma"), "Luma SF");
        assert_eq!(c.label_for("unknown"), "unknown");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let doubled = format!("{TEST_TOML}\n{}", r#"
[[source]]
key = "simon"
label = "Simon again"
section = "dup"
kind = "rss"
url = "https://example.net/feed/"
"#);
        assert!(SourceCatalog::from_toml_str(&doubled).is_err());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(SourceCatalog::from_toml_str("").is_err());
    }
}
