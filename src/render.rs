// src/render.rs
//! Markdown-lite → HTML conversion and full email assembly. The summaries use
//! only bullets, bold, and links, so a small converter beats a full markdown
//! dependency here.

use std::collections::BTreeMap;

use crate::sources::SourceCatalog;
use crate::today_str;

const SECTION_STYLE: &str = "margin-bottom: 32px;";
const HEADER_STYLE: &str = "font-size: 13px; font-weight: 700; letter-spacing: 0.08em; \
    text-transform: uppercase; color: #6b7280; border-bottom: 1px solid #e5e7eb; \
    padding-bottom: 6px; margin-bottom: 12px;";
const BODY_STYLE: &str = "font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; \
    font-size: 15px; line-height: 1.6; color: #1f2937; \
    max-width: 640px; margin: 0 auto; padding: 24px 16px;";
const INTRO_STYLE: &str = "background: #f9fafb; border-left: 3px solid #6366f1; \
    padding: 12px 16px; margin-bottom: 32px; border-radius: 0 6px 6px 0; \
    font-style: italic; color: #374151;";

fn apply_inline(s: &str) -> String {
    // 1. [text](url) markdown links FIRST, before bare URL linkify
    static RE_MD_LINK: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_md_link = RE_MD_LINK
        .get_or_init(|| regex::Regex::new(r"\[([^\]]+)\]\((https?://[^\)]+)\)").unwrap());
    let out = re_md_link.replace_all(s, r#"<a href="$2">$1</a>"#);

    // 2. Bold
    static RE_BOLD: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_bold = RE_BOLD.get_or_init(|| regex::Regex::new(r"\*\*(.+?)\*\*").unwrap());
    let out = re_bold.replace_all(&out, "<strong>$1</strong>");

    // 3. Bare URLs. No lookbehind in the regex crate, so match the preceding
    //    character instead; quotes mark URLs already inside an href.
    static RE_BARE_URL: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_bare_url = RE_BARE_URL
        .get_or_init(|| regex::Regex::new(r#"(^|[^"'])(https?://[^\s<>"']+)"#).unwrap());
    re_bare_url
        .replace_all(&out, |caps: &regex::Captures| {
            format!(r#"{}<a href="{}">{}</a>"#, &caps[1], &caps[2], &caps[2])
        })
        .to_string()
}

/// Convert basic markdown (bullets, bold, links) to HTML.
pub fn md_to_html(text: &str) -> String {
    let mut html_lines = Vec::new();
    let mut in_list = false;
    for line in text.lines() {
        let stripped = line.trim();
        if stripped.starts_with("- ") || stripped.starts_with("* ") {
            if !in_list {
                html_lines.push("<ul>".to_string());
                in_list = true;
            }
            html_lines.push(format!("  <li>{}</li>", apply_inline(&stripped[2..])));
        } else {
            if in_list {
                html_lines.push("</ul>".to_string());
                in_list = false;
            }
            if !stripped.is_empty() {
                html_lines.push(format!("<p>{}</p>", apply_inline(stripped)));
            }
        }
    }
    if in_list {
        html_lines.push("</ul>".to_string());
    }
    html_lines.join("\n")
}

/// Assemble the full HTML email: greeting, date line, editorial intro,
/// per-section blocks in catalog order, and a footer noting unavailable
/// sources.
pub fn build_html(
    catalog: &SourceCatalog,
    summaries: &BTreeMap<String, String>,
    editorial_intro: &str,
    failed_sources: &[String],
) -> String {
    let intro_block = if editorial_intro.is_empty() {
        String::new()
    } else {
        format!(r#"<div style="{INTRO_STYLE}">{editorial_intro}</div>"#)
    };

    let mut section_blocks = String::new();
    for spec in &catalog.sources {
        let body = summaries
            .get(&spec.key)
            .map(String::as_str)
            .unwrap_or("")
            .trim();
        if body.is_empty() {
            continue;
        }
        let body_html = md_to_html(body);
        section_blocks.push_str(&format!(
            r#"
        <div style="{SECTION_STYLE}">
            <div style="{HEADER_STYLE}">{icon} {title}</div>
            {body_html}
        </div>
        "#,
            icon = spec.icon,
            title = spec.section,
        ));
    }

    let failed_note = if failed_sources.is_empty() {
        String::new()
    } else {
        let labels: Vec<String> = failed_sources
            .iter()
            .map(|k| catalog.label_for(k))
            .collect();
        format!(
            r#"<p style="color:#9ca3af; font-size:12px; margin-top:16px;">⚠️ Unavailable today: {}</p>"#,
            labels.join(", ")
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body>
    <div style="{BODY_STYLE}">
        <h1 style="font-size:22px; font-weight:700; margin-bottom:4px;">
            Good morning ☀️
        </h1>
        <p style="color:#6b7280; margin-top:0; margin-bottom:24px;">
            Your daily digest for {date}
        </p>
        {intro_block}
        {section_blocks}
        {failed_note}
        <p style="color:#9ca3af; font-size:12px; margin-top:40px; border-top:1px solid #e5e7eb; padding-top:16px;">
            Generated automatically · <a href="https://github.com/sumoseah/daily-digest" style="color:#9ca3af;">View source</a>
        </p>
    </div>
</body>
</html>
"#,
        date = today_str(),
    )
}
