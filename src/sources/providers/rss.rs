// src/sources/providers/rss.rs
//! RSS 2.0 / Atom feed source. Emits one dash-prefixed headline line per
//! entry, optionally followed by a short normalized summary.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::sources::types::FetchSource;
use crate::sources::{normalize_text, truncate_chars};

const SUMMARY_BUDGET: usize = 200;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

// Atom elements may carry a type attribute, so text lands in `$text`.
#[derive(Debug, Default, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}
#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Clone)]
struct FeedItem {
    title: String,
    link: String,
    summary: String,
}

pub struct RssSource {
    key: String,
    limit: usize,
    with_summary: bool,
    mode: Mode,
}

enum Mode {
    Http {
        url: String,
        fallback_url: Option<String>,
        client: reqwest::Client,
    },
    Fixture(String),
}

impl RssSource {
    pub fn from_url(
        key: &str,
        url: &str,
        fallback_url: Option<String>,
        limit: usize,
        with_summary: bool,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("daily-digest/0.1 (+github.com/sumoseah/daily-digest)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            key: key.to_string(),
            limit,
            with_summary,
            mode: Mode::Http {
                url: url.to_string(),
                fallback_url,
                client,
            },
        }
    }

    /// Parse a raw feed document instead of fetching (tests).
    pub fn from_fixture_str(key: &str, xml: &str, limit: usize, with_summary: bool) -> Self {
        Self {
            key: key.to_string(),
            limit,
            with_summary,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_items(xml: &str) -> Result<Vec<FeedItem>> {
        let xml_clean = scrub_html_entities_for_xml(xml);

        if let Ok(rss) = from_str::<Rss>(&xml_clean) {
            let items = rss
                .channel
                .item
                .into_iter()
                .map(|it| FeedItem {
                    title: normalize_text(it.title.as_deref().unwrap_or_default()),
                    link: it.link.unwrap_or_default().trim().to_string(),
                    summary: normalize_text(it.description.as_deref().unwrap_or_default()),
                })
                .collect();
            return Ok(items);
        }

        let feed: AtomFeed = from_str(&xml_clean).context("parsing feed xml")?;
        let items = feed
            .entry
            .into_iter()
            .map(|en| {
                let link = en
                    .link
                    .iter()
                    .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                    .or_else(|| en.link.first())
                    .and_then(|l| l.href.clone())
                    .unwrap_or_default();
                let summary = en
                    .summary
                    .or(en.content)
                    .map(|t| normalize_text(&t.value))
                    .unwrap_or_default();
                FeedItem {
                    title: normalize_text(&en.title.unwrap_or_default().value),
                    link,
                    summary,
                }
            })
            .collect();
        Ok(items)
    }

    fn format_lines(&self, items: &[FeedItem]) -> String {
        let mut out = String::new();
        for it in items.iter().take(self.limit) {
            if it.title.is_empty() {
                continue;
            }
            out.push_str(&format!("- {}: {}\n", it.title, it.link));
            if self.with_summary && !it.summary.is_empty() {
                out.push_str(&format!("  {}\n", truncate_chars(&it.summary, SUMMARY_BUDGET)));
            }
        }
        out.trim_end().to_string()
    }

    async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
        let resp = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("feed http get {url}"))?;
        resp.error_for_status_ref()
            .with_context(|| format!("feed http status for {url}"))?;
        resp.text().await.context("feed http .text()")
    }
}

#[async_trait]
impl FetchSource for RssSource {
    async fn fetch(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(xml) => Ok(self.format_lines(&Self::parse_items(xml)?)),
            Mode::Http {
                url,
                fallback_url,
                client,
            } => {
                let body = Self::fetch_body(client, url).await?;
                let mut items = Self::parse_items(&body)?;

                if items.is_empty() {
                    if let Some(fb) = fallback_url {
                        let body = Self::fetch_body(client, fb).await?;
                        items = Self::parse_items(&body)?;
                    }
                }

                Ok(self.format_lines(&items))
            }
        }
    }

    fn key(&self) -> &str {
        &self.key
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
