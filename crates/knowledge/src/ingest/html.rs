//! HTML page parsing: title, publish date, main text and links.

use crate::types::UNKNOWN_DATE;
use ragcourse_core::{AppError, AppResult};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Title recorded when a page has no `<title>`.
pub const NO_TITLE: &str = "No Title Found";

/// Dates such as `12 Jan 2024`, `3rd March, 2023` or `2024-01-12`.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}[-/thstndrd\s]+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*[-/\s,]*\d{2,4}|\d{4}-\d{2}-\d{2})\b",
    )
    .expect("Invalid date regex pattern")
});

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid title selector"));
static PUBLISH_META: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="article:published_time"], meta[name="publish_date"]"#)
        .expect("Invalid publish date selector")
});
static MAIN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("Invalid main selector"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("Invalid body selector"));
static LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid link selector"));

/// Elements whose text is never visible.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "head"];

/// Everything pulled out of one HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub title: String,
    pub published_at: String,
    pub content: String,
    pub links: Vec<String>,
}

/// Parse a page fetched from `base_url`.
pub fn parse_page(html: &str, base_url: &str) -> AppResult<ParsedPage> {
    let base = url::Url::parse(base_url)
        .map_err(|e| AppError::Ingest(format!("Invalid base URL {}: {}", base_url, e)))?;
    let document = Html::parse_document(html);

    Ok(ParsedPage {
        title: extract_title(&document),
        published_at: extract_publish_date(&document),
        content: extract_main_text(&document),
        links: extract_links(&document, &base),
    })
}

/// Visible text of an HTML string, preferring `<main>` over `<body>`.
pub fn html_to_text(html: &str) -> String {
    extract_main_text(&Html::parse_document(html))
}

fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// Publish date from the page's meta tags, else the first date in its text.
fn extract_publish_date(document: &Html) -> String {
    if let Some(content) = document
        .select(&PUBLISH_META)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
    {
        return content.to_string();
    }

    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    let text = parts.join("\n");

    DATE_PATTERN
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn extract_main_text(document: &Html) -> String {
    let container = document
        .select(&MAIN)
        .next()
        .or_else(|| document.select(&BODY).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_text(container, &mut parts);
    collapse_blank_lines(&parts.join("\n"))
}

/// Recursively collect trimmed text nodes, skipping invisible elements.
fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    use scraper::node::Node;

    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

/// Absolute http(s) links in document order, without duplicates.
fn extract_links(document: &Html, base: &url::Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&LINKS) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }

        if let Ok(mut absolute) = base.join(href) {
            if absolute.scheme() != "http" && absolute.scheme() != "https" {
                continue;
            }
            absolute.set_fragment(None);
            let link = absolute.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Trim each line and collapse runs of blank lines into one.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = false;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html>
          <head>
            <title> CS Courses | Harvey Mudd College </title>
            <meta property="article:published_time" content="2024-08-01">
            <script>var x = 1;</script>
          </head>
          <body>
            <nav><a href="/">Home</a></nav>
            <main>
              <h1>CSCI070</h1>
              <p>Prerequisites: <b>CSCI060</b></p>
              <a href="courses/csci081#top">Next</a>
              <a href="https://other.edu/x">Elsewhere</a>
              <a href="mailto:cs@hmc.edu">Mail</a>
              <a href="#section">Anchor</a>
            </main>
          </body>
        </html>
    "##;

    #[test]
    fn test_parse_page() {
        let page = parse_page(PAGE, "https://www.hmc.edu/cs/").unwrap();
        assert_eq!(page.title, "CS Courses | Harvey Mudd College");
        assert_eq!(page.published_at, "2024-08-01");
        assert_eq!(page.content, "CSCI070\nPrerequisites:\nCSCI060\nNext\nElsewhere\nMail\nAnchor");
        assert_eq!(
            page.links,
            vec![
                "https://www.hmc.edu/".to_string(),
                "https://www.hmc.edu/cs/courses/csci081".to_string(),
                "https://other.edu/x".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_title_and_main() {
        let page = parse_page(
            "<html><body><p>Posted 12 Jan 2024</p><p>Body text</p></body></html>",
            "https://www.hmc.edu/",
        )
        .unwrap();
        assert_eq!(page.title, NO_TITLE);
        assert_eq!(page.published_at, "12 Jan 2024");
        assert!(page.content.contains("Body text"));
    }

    #[test]
    fn test_unknown_publish_date() {
        let page = parse_page("<html><body>No dates here</body></html>", "https://www.hmc.edu/")
            .unwrap();
        assert_eq!(page.published_at, UNKNOWN_DATE);
    }

    #[test]
    fn test_meta_publish_date_by_name() {
        let html = r#"<html><head><meta name="publish_date" content="May 3, 2022"></head><body>x</body></html>"#;
        let page = parse_page(html, "https://www.hmc.edu/").unwrap();
        assert_eq!(page.published_at, "May 3, 2022");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_page(PAGE, "not a url"),
            Err(AppError::Ingest(_))
        ));
    }

    #[test]
    fn test_html_to_text_falls_back_to_body() {
        assert_eq!(
            html_to_text("<html><body><script>x()</script><p>Course list</p></body></html>"),
            "Course list"
        );
        assert_eq!(html_to_text("<main>First</main><main>Second</main>"), "First");
    }

    #[test]
    fn test_pages_parse_repeatedly() {
        for n in 1..=3 {
            let page = parse_page(PAGE, "https://www.hmc.edu/cs/").unwrap();
            assert_eq!(page.published_at, "2024-08-01", "parse {}", n);
            assert_eq!(page.links.len(), 3);
        }
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n  \nb\nc  \n\n"), "a\n\nb\nc");
        assert_eq!(collapse_blank_lines("\n\n"), "");
    }
}
