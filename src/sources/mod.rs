// src/sources/mod.rs
pub mod catalog;
pub mod providers;
pub mod types;

pub use catalog::{SourceCatalog, SourceKind, SourceSpec};
pub use providers::newsletter::MailboxConfig;
pub use types::{FetchOutcome, FetchStatus, FetchSource};

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use providers::{events::EventsSource, newsletter::NewsletterSource, rss::RssSource};

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Character-budget truncation, safe on multi-byte text.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// Short content id for logs. Newsletter bodies are private mail; log ids, not text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Build one provider per catalog entry. Newsletter sources require IMAP
/// credentials up front; their absence is a configuration error, not a
/// per-source fetch failure.
pub fn build_providers(
    catalog: &SourceCatalog,
    mailbox: Option<MailboxConfig>,
) -> Result<Vec<Box<dyn FetchSource>>> {
    let mut out: Vec<Box<dyn FetchSource>> = Vec::with_capacity(catalog.sources.len());
    for spec in &catalog.sources {
        match &spec.kind {
            SourceKind::Rss {
                url,
                fallback_url,
                limit,
                with_summary,
            } => {
                out.push(Box::new(RssSource::from_url(
                    &spec.key,
                    url,
                    fallback_url.clone(),
                    *limit,
                    *with_summary,
                )));
            }
            SourceKind::Newsletter { sender, subject } => {
                let Some(cfg) = mailbox.clone() else {
                    bail!(
                        "source `{}` needs IMAP credentials (IMAP_USER / IMAP_PASS)",
                        spec.key
                    );
                };
                out.push(Box::new(NewsletterSource::new(&spec.key, sender, subject, cfg)));
            }
            SourceKind::Events { url, limit } => {
                out.push(Box::new(EventsSource::from_url(&spec.key, url, *limit)));
            }
        }
    }
    Ok(out)
}

/// Fetch every source. Total function: each provider key appears exactly once
/// in both maps; a failing source yields empty text plus a recorded error.
pub async fn collect(
    providers: &[Box<dyn FetchSource>],
) -> (BTreeMap<String, String>, BTreeMap<String, FetchStatus>) {
    let mut raw = BTreeMap::new();
    let mut fetch_log = BTreeMap::new();

    for p in providers {
        match p.fetch().await {
            Ok(text) => {
                fetch_log.insert(
                    p.key().to_string(),
                    FetchStatus {
                        chars: text.chars().count(),
                        status: FetchOutcome::Ok,
                        error: None,
                    },
                );
                raw.insert(p.key().to_string(), text);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = p.key(), "source fetch failed");
                fetch_log.insert(
                    p.key().to_string(),
                    FetchStatus {
                        chars: 0,
                        status: FetchOutcome::Failed,
                        error: Some(format!("{e:#}")),
                    },
                );
                raw.insert(p.key().to_string(), String::new());
            }
        }
    }

    (raw, fetch_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b></p>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn normalize_text_keeps_trailing_punctuation() {
        assert_eq!(normalize_text("What's new?"), "What's new?");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("some newsletter body");
        let b = anon_hash("some newsletter body");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }
}
