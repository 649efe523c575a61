// tests/providers_rss.rs
//
// Feed parsing and line formatting against inline fixtures, both RSS 2.0 and
// Atom documents.

use daily_digest::sources::providers::rss::RssSource;
use daily_digest::sources::FetchSource;

const RSS2_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>TechCrunch Venture</title>
    <item>
      <title>AI agent startup raises $200M</title>
      <link>https://techcrunch.com/ai-agent-series-c/</link>
      <description>&lt;p&gt;The round values the company at&nbsp;$2B.&lt;/p&gt;</description>
    </item>
    <item>
      <title>Second story &amp; its sequel</title>
      <link>https://techcrunch.com/second/</link>
      <description>More details inside.</description>
    </item>
    <item>
      <title>Third story</title>
      <link>https://techcrunch.com/third/</link>
    </item>
  </channel>
</rss>"#;

const ATOM_FIXTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Simon Willison's Weblog</title>
  <entry>
    <title>Notes on building LLM-powered developer tools</title>
    <link rel="alternate" href="https://simonwillison.net/2026/llm-tools/"/>
    <summary type="html">Why the adapter layer matters more than the model.</summary>
  </entry>
  <entry>
    <title>Quick links</title>
    <link href="https://simonwillison.net/2026/quick-links/"/>
  </entry>
</feed>"#;

#[tokio::test]
async fn rss2_items_become_dash_lines() {
    let src = RssSource::from_fixture_str("techcrunch", RSS2_FIXTURE, 10, false);
    let text = src.fetch().await.expect("fixture fetch");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "- AI agent startup raises $200M: https://techcrunch.com/ai-agent-series-c/"
    );
    assert_eq!(lines[1], "- Second story & its sequel: https://techcrunch.com/second/");
}

#[tokio::test]
async fn item_limit_is_respected() {
    let src = RssSource::from_fixture_str("techcrunch", RSS2_FIXTURE, 1, false);
    let text = src.fetch().await.expect("fixture fetch");
    assert_eq!(text.lines().count(), 1);
}

#[tokio::test]
async fn summaries_are_indented_under_their_headline() {
    let src = RssSource::from_fixture_str("techcrunch", RSS2_FIXTURE, 10, true);
    let text = src.fetch().await.expect("fixture fetch");
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("- AI agent startup"));
    assert_eq!(lines[1], "  The round values the company at $2B.");
    // third item has no description, so no summary line follows it
    assert!(lines.last().unwrap().starts_with("- Third story"));
}

#[tokio::test]
async fn atom_entries_parse_with_alternate_links() {
    let src = RssSource::from_fixture_str("simon", ATOM_FIXTURE, 10, true);
    let text = src.fetch().await.expect("fixture fetch");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "- Notes on building LLM-powered developer tools: https://simonwillison.net/2026/llm-tools/"
    );
    assert_eq!(lines[1], "  Why the adapter layer matters more than the model.");
    assert_eq!(lines[2], "- Quick links: https://simonwillison.net/2026/quick-links/");
}

#[tokio::test]
async fn unparseable_documents_error() {
    let src = RssSource::from_fixture_str("broken", "this is not xml at all", 10, false);
    assert!(src.fetch().await.is_err());
}
