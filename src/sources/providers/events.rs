// src/sources/providers/events.rs
//! Events page source. The page is JS-rendered; the server payload ships in a
//! `__NEXT_DATA__` JSON blob, so we pull the first usable event array out of
//! `props.pageProps`. An empty payload is reported as a fetch error so the
//! footer can list the source as unavailable.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::sources::truncate_chars;
use crate::sources::types::FetchSource;

#[derive(Debug, Clone, PartialEq)]
struct EventItem {
    name: String,
    url: String,
    date: String,
}

pub struct EventsSource {
    key: String,
    limit: usize,
    mode: Mode,
}

enum Mode {
    Http { url: String, client: reqwest::Client },
    Fixture(String),
}

impl EventsSource {
    pub fn from_url(key: &str, url: &str, limit: usize) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; DailyDigestBot/1.0)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            key: key.to_string(),
            limit,
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    /// Parse a raw HTML document instead of fetching (tests).
    pub fn from_fixture_str(key: &str, html: &str, limit: usize) -> Self {
        Self {
            key: key.to_string(),
            limit,
            mode: Mode::Fixture(html.to_string()),
        }
    }

    fn format_lines(&self, events: &[EventItem]) -> String {
        let mut out = String::new();
        for ev in events.iter().take(self.limit) {
            let date = if ev.date.is_empty() {
                "TBD".to_string()
            } else {
                truncate_chars(&ev.date, 10)
            };
            out.push_str(&format!("- {} | {} | {}\n", ev.name, date, ev.url));
        }
        out.trim_end().to_string()
    }
}

#[async_trait]
impl FetchSource for EventsSource {
    async fn fetch(&self) -> Result<String> {
        let html = match &self.mode {
            Mode::Fixture(html) => html.clone(),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("events http get {url}"))?;
                resp.error_for_status_ref()
                    .with_context(|| format!("events http status for {url}"))?;
                resp.text().await.context("events http .text()")?
            }
        };

        let events = parse_events(&html);
        if events.is_empty() {
            return Err(anyhow!("JS-rendered page returned no events"));
        }
        Ok(self.format_lines(&events))
    }

    fn key(&self) -> &str {
        &self.key
    }
}

fn parse_events(html: &str) -> Vec<EventItem> {
    static RE_NEXT_DATA: once_cell::sync::OnceCell<regex::Regex> =
        once_cell::sync::OnceCell::new();
    let re = RE_NEXT_DATA.get_or_init(|| {
        regex::Regex::new(r#"(?is)<script[^>]*id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).unwrap()
    });

    let Some(caps) = re.captures(html) else {
        return Vec::new();
    };
    let Ok(data) = serde_json::from_str::<Value>(&caps[1]) else {
        return Vec::new();
    };

    let props = &data["props"]["pageProps"];
    let raw = first_event_array(props);

    raw.iter()
        .filter_map(|ev| {
            let name = str_field(ev, &["name", "title"])?;
            let mut url = str_field(ev, &["url", "event_url"]).unwrap_or_default();
            if !url.is_empty() && !url.starts_with("http") {
                url = format!("https://lu.ma/{url}");
            }
            let date = str_field(ev, &["start_at", "start"]).unwrap_or_default();
            Some(EventItem { name, url, date })
        })
        .collect()
}

// First non-empty array under the well-known pageProps keys, one level deep.
fn first_event_array(props: &Value) -> Vec<Value> {
    for key in ["initialData", "events", "data"] {
        match props.get(key) {
            Some(Value::Array(a)) if !a.is_empty() => return a.clone(),
            Some(Value::Object(o)) => {
                for sub in o.values() {
                    if let Value::Array(a) = sub {
                        if !a.is_empty() {
                            return a.clone();
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Vec::new()
}

fn str_field(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<html><body>
<script id="__NEXT_DATA__" type="application/json">
{"props":{"pageProps":{"initialData":[
  {"name":"Rust SF Meetup","url":"rust-sf","start_at":"2026-08-06T18:00:00Z"},
  {"title":"AI Builders Night","event_url":"https://lu.ma/ai-builders","start":""},
  {"irrelevant":true}
]}}}
</script></body></html>"#;

    #[test]
    fn parses_next_data_events() {
        let evs = parse_events(FIXTURE);
        assert_eq!(evs.len(), 2);
        assert_eq!(evs[0].name, "Rust SF Meetup");
        assert_eq!(evs[0].url, "https://lu.ma/rust-sf");
        assert_eq!(evs[1].name, "AI Builders Night");
        assert_eq!(evs[1].url, "https://lu.ma/ai-builders");
    }

    #[test]
    fn missing_blob_yields_no_events() {
        assert!(parse_events("<html><body>nothing here</body></html>").is_empty());
    }

    #[tokio::test]
    async fn fixture_fetch_formats_lines() {
        let src = EventsSource::from_fixture_str("luma", FIXTURE, 10);
        let text = src.fetch().await.expect("fixture fetch");
        assert_eq!(
            text,
            "- Rust SF Meetup | 2026-08-06 | https://lu.ma/rust-sf\n- AI Builders Night | TBD | https://lu.ma/ai-builders"
        );
    }

    #[tokio::test]
    async fn empty_page_is_an_error() {
        let src = EventsSource::from_fixture_str("luma", "<html></html>", 10);
        let err = src.fetch().await.expect_err("no events should error");
        assert!(err.to_string().contains("no events"));
    }
}
