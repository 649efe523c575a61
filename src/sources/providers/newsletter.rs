// src/sources/providers/newsletter.rs
//! Newsletter source: pulls the most recent matching email over IMAP and
//! returns its plain-text body, truncated to a fixed budget.
//!
//! The imap session is blocking, so the whole exchange runs under
//! `spawn_blocking`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::sources::types::FetchSource;
use crate::sources::{anon_hash, truncate_chars};

const BODY_BUDGET: usize = 6000;

pub const ENV_IMAP_HOST: &str = "IMAP_HOST";
pub const ENV_IMAP_PORT: &str = "IMAP_PORT";
pub const ENV_IMAP_USER: &str = "IMAP_USER";
pub const ENV_IMAP_PASS: &str = "IMAP_PASS";

const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
const DEFAULT_IMAP_PORT: u16 = 993;

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

impl MailboxConfig {
    /// Required when any newsletter source is configured; missing credentials
    /// are a startup error, not a per-source failure.
    pub fn from_env() -> Result<Self> {
        let host =
            std::env::var(ENV_IMAP_HOST).unwrap_or_else(|_| DEFAULT_IMAP_HOST.to_string());
        let port = std::env::var(ENV_IMAP_PORT)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_IMAP_PORT);
        let user = std::env::var(ENV_IMAP_USER).context("IMAP_USER missing")?;
        let pass = std::env::var(ENV_IMAP_PASS).context("IMAP_PASS missing")?;
        Ok(Self {
            host,
            port,
            user,
            pass,
        })
    }
}

pub struct NewsletterSource {
    key: String,
    sender: String,
    subject: String,
    config: MailboxConfig,
}

impl NewsletterSource {
    pub fn new(key: &str, sender: &str, subject: &str, config: MailboxConfig) -> Self {
        Self {
            key: key.to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            config,
        }
    }
}

#[async_trait]
impl FetchSource for NewsletterSource {
    async fn fetch(&self) -> Result<String> {
        let cfg = self.config.clone();
        let sender = self.sender.clone();
        let subject = self.subject.clone();
        let key = self.key.clone();

        let body = tokio::task::spawn_blocking(move || fetch_blocking(&cfg, &sender, &subject))
            .await
            .context("newsletter fetch task")??;

        if !body.is_empty() {
            tracing::debug!(
                source = %key,
                id = %anon_hash(&body),
                chars = body.chars().count(),
                "newsletter body fetched"
            );
        }
        Ok(body)
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// Find the newest message FROM `sender` (falling back to SUBJECT `subject`)
/// and return its body text. No match is an empty result, not an error.
fn fetch_blocking(cfg: &MailboxConfig, sender: &str, subject: &str) -> Result<String> {
    let tls = native_tls::TlsConnector::builder()
        .build()
        .context("building tls connector")?;
    let client = imap::connect((cfg.host.as_str(), cfg.port), &cfg.host, &tls)
        .with_context(|| format!("imap connect to {}:{}", cfg.host, cfg.port))?;
    let mut session = client
        .login(&cfg.user, &cfg.pass)
        .map_err(|(e, _)| anyhow!("imap login: {e}"))?;
    session.select("INBOX").context("selecting inbox")?;

    let mut ids = session
        .search(format!("FROM \"{sender}\""))
        .context("imap search by sender")?;
    if ids.is_empty() {
        ids = session
            .search(format!("SUBJECT \"{subject}\""))
            .context("imap search by subject")?;
    }

    let Some(latest) = ids.iter().max().copied() else {
        session.logout().ok();
        return Ok(String::new());
    };

    let messages = session
        .fetch(latest.to_string(), "RFC822")
        .context("imap fetch")?;
    let body = messages
        .iter()
        .next()
        .and_then(|m| m.body())
        .map(extract_body)
        .unwrap_or_default();

    session.logout().ok();
    Ok(truncate_chars(&body, BODY_BUDGET))
}

fn extract_body(raw: &[u8]) -> String {
    let Some(msg) = mail_parser::MessageParser::default().parse(raw) else {
        return String::new();
    };
    if let Some(text) = msg.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = msg.body_html(0) {
        return html_to_text(&html);
    }
    String::new()
}

// Keep paragraph breaks so the curator's line handling still works.
fn html_to_text(html: &str) -> String {
    static RE_BREAKS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_breaks =
        RE_BREAKS.get_or_init(|| regex::Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</li>").unwrap());
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());

    let with_breaks = re_breaks.replace_all(html, "\n");
    let stripped = re_tags.replace_all(&with_breaks, "");
    let decoded = html_escape::decode_html_entities(&stripped).to_string();

    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
