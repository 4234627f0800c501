//! Content extraction functionality for the crawler module

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Elements whose text is collected as blocks, in document order
const BLOCK_SELECTOR: &str =
    "p, div, span, article, section, h1, h2, h3, h4, h5, h6, li, td, th, blockquote";

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// Boilerplate phrases removed from every text block
static BOILERPLATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)cookie policy|privacy policy|terms of service",
        r"(?i)subscribe|newsletter|advertisement",
        r"(?i)share your thoughts|help us enhance",
        r"(?i)download.*?app|get it on.*?store",
        r"(?i)follow us on|social media",
        r"(?i)copyright.*?reserved|all rights reserved",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Text extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// URL the page was fetched from
    pub url: String,

    /// Cleaned `<title>`, if any
    pub title: Option<String>,

    /// Cleaned text blocks in document order
    pub blocks: Vec<String>,
}

impl ExtractedPage {
    /// Page text: the title line followed by the blocks, separated by blank lines
    pub fn text(&self) -> String {
        self.title
            .iter()
            .map(|t| format!("Title: {}", t))
            .chain(self.blocks.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize scraped text.
///
/// Collapses whitespace runs to single spaces and strips boilerplate phrases
/// (cookie and privacy notices, subscribe and share prompts, app store
/// banners, copyright lines).
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let collapsed = collapse_whitespace(text);
    let stripped = BOILERPLATE_PATTERNS
        .iter()
        .fold(collapsed, |acc, re| re.replace_all(&acc, "").into_owned());

    collapse_whitespace(&stripped)
}

fn has_text(document: &Html) -> bool {
    document
        .root_element()
        .text()
        .any(|t| !t.trim().is_empty())
}

/// Parse a response body.
///
/// Tries a full document parse, then a fragment parse, then a tag-stripping
/// pass whose text is wrapped in a minimal document. Fails only when the body
/// carries no text at all.
pub fn parse_html(body: &[u8]) -> Result<Html, CrawlError> {
    let source = match String::from_utf8(body.to_vec()) {
        Ok(s) => s,
        Err(_) => {
            debug!("Body is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(body).into_owned()
        }
    };

    if source.trim().is_empty() {
        return Err(CrawlError::HtmlParse("empty document".to_string()));
    }

    let document = Html::parse_document(&source);
    if has_text(&document) {
        return Ok(document);
    }

    debug!("Document parse produced no text, trying fragment parse");
    let fragment = Html::parse_fragment(&source);
    if has_text(&fragment) {
        return Ok(fragment);
    }

    debug!("Fragment parse produced no text, stripping tags");
    let stripped = TAG
        .iter()
        .fold(source.clone(), |acc, re| re.replace_all(&acc, " ").into_owned());
    let stripped = collapse_whitespace(&stripped);
    if stripped.is_empty() {
        return Err(CrawlError::HtmlParse("document has no text content".to_string()));
    }

    let minimal = format!(
        "<html><body><p>{}</p></body></html>",
        stripped.replace('<', "&lt;")
    );
    Ok(Html::parse_document(&minimal))
}

fn parse_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Failed to parse selector '{}': {}", s, e);
                None
            }
        })
        .collect()
}

fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|_| CrawlError::Selector(selector.to_string()))
}

/// Detach every element matching the exclude selectors from the tree
fn remove_excluded(document: &mut Html, exclude_selectors: &[String]) {
    let ids: Vec<_> = parse_selectors(exclude_selectors)
        .iter()
        .flat_map(|selector| {
            document
                .root_element()
                .select(selector)
                .map(|e| e.id())
                .collect::<Vec<_>>()
        })
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// First element matching a content selector, else `<body>`, else the root.
///
/// Lookups start from the root element so subtrees detached by
/// `remove_excluded` are never matched.
fn content_region<'a>(
    document: &'a Html,
    content_selectors: &[String],
) -> Result<ElementRef<'a>, CrawlError> {
    let root = document.root_element();
    let region = parse_selectors(content_selectors)
        .iter()
        .find_map(|selector| root.select(selector).next());
    if let Some(region) = region {
        return Ok(region);
    }

    let body = parse_selector("body")?;
    Ok(root.select(&body).next().unwrap_or(root))
}

/// Extract cleaned text from a parsed document.
///
/// Non-content elements are removed from `document` in place, so links
/// discovered afterwards come only from the remaining markup.
pub fn extract_content(
    document: &mut Html,
    url: &Url,
    config: &CrawlerConfig,
) -> Result<ExtractedPage, CrawlError> {
    remove_excluded(document, &config.exclude_selectors);

    let title_selector = parse_selector("title")?;
    let title = document
        .root_element()
        .select(&title_selector)
        .next()
        .map(|e| clean_text(&e.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let region = content_region(document, &config.content_selectors)?;
    let block_selector = parse_selector(BLOCK_SELECTOR)?;

    let mut blocks: Vec<String> = region
        .select(&block_selector)
        .map(|e| clean_text(&e.text().collect::<String>()))
        .filter(|t| t.chars().count() > config.min_block_chars)
        .collect();

    if title.iter().count() + blocks.len() <= 1 {
        let flattened = clean_text(&region.text().collect::<String>());
        if !flattened.is_empty() {
            debug!("Few blocks on {}, using flattened region text", url);
            blocks.push(flattened);
        }
    }

    Ok(ExtractedPage {
        url: url.to_string(),
        title,
        blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> ExtractedPage {
        let mut document = parse_html(html.as_bytes()).unwrap();
        let url = Url::parse("https://example.com/page").unwrap();
        extract_content(&mut document, &url, &CrawlerConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  The   five\n\tpillars  "), "The five pillars");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_clean_text_strips_boilerplate() {
        let cleaned = clean_text("Read the Privacy Policy then SUBSCRIBE to our newsletter today");
        assert_eq!(cleaned, "Read the then to our today");

        let cleaned = clean_text("Copyright 2024 Example. All rights reserved. Prayer times");
        assert_eq!(cleaned, ". Prayer times");
    }

    #[test]
    fn test_extracts_main_region_blocks() {
        let page = extract(
            r#"<html><head><title>Five  Pillars</title></head><body>
            <nav><p>Home navigation link list here</p></nav>
            <main>
              <h1>The Five Pillars of Islam</h1>
              <p>Shahada is the declaration of faith.</p>
              <p>Short one</p>
            </main>
            <footer><p>Footer text that is long enough</p></footer>
            </body></html>"#,
        );

        assert_eq!(page.title.as_deref(), Some("Five Pillars"));
        assert_eq!(
            page.blocks,
            vec![
                "The Five Pillars of Islam".to_string(),
                "Shahada is the declaration of faith.".to_string(),
            ]
        );
        assert!(page.text().starts_with("Title: Five Pillars\n\nThe Five Pillars"));
    }

    #[test]
    fn test_excluded_elements_are_removed() {
        let page = extract(
            r#"<html><body><article>
            <p>Zakat is the giving of alms to those in need.</p>
            <script>var tracking = "a long script body that is not content";</script>
            <aside><p>Related articles you might enjoy reading</p></aside>
            </article></body></html>"#,
        );

        let text = page.text();
        assert!(text.contains("Zakat"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Related articles"));
    }

    #[test]
    fn test_region_inside_excluded_element_is_ignored() {
        let page = extract(
            r#"<html><body>
            <header><article><p>Header promo banner text that is long enough</p></article></header>
            <div class="content"><p>Hajj is the pilgrimage to Mecca made once in a lifetime.</p></div>
            </body></html>"#,
        );

        let text = page.text();
        assert!(text.contains("Hajj is the pilgrimage"));
        assert!(!text.contains("Header promo"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let page = extract(
            "<html><body><div><p>Sawm is fasting during the month of Ramadan.</p></div></body></html>",
        );
        assert!(page.blocks.iter().any(|b| b.contains("Sawm is fasting")));
    }

    #[test]
    fn test_flattens_region_when_blocks_are_short() {
        let page = extract("<html><body><main>Salah <b>is</b> prayer <i>five times</i> daily</main></body></html>");

        assert_eq!(page.title, None);
        assert_eq!(page.blocks, vec!["Salah is prayer five times daily".to_string()]);
    }

    #[test]
    fn test_parse_plain_text_body() {
        let document = parse_html(b"just some text without markup").unwrap();
        let text: String = document.root_element().text().collect();
        assert!(text.contains("just some text"));
    }

    #[test]
    fn test_parse_lossy_utf8() {
        let mut body = b"<p>Hajj pilgrimage ".to_vec();
        body.push(0xFF);
        body.extend_from_slice(b" to Mecca</p>");
        assert!(parse_html(&body).is_ok());
    }

    #[test]
    fn test_parse_empty_body_fails() {
        assert!(matches!(parse_html(b"  \n "), Err(CrawlError::HtmlParse(_))));
        assert!(matches!(
            parse_html(b"<html><head></head><body></body></html>"),
            Err(CrawlError::HtmlParse(_))
        ));
    }
}
