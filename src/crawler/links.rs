//! Same-site link discovery

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::normalize_url;

/// Whether two URLs share host and explicit port; the scheme may differ
fn same_site(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

/// Resolve an href against the page it was found on.
///
/// Returns `None` for non-http(s) targets such as `mailto:` or `javascript:`.
fn resolve_link(page_url: &Url, href: &str) -> Option<Url> {
    let mut joined = page_url.join(href.trim()).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    normalize_url(joined.as_str()).ok()
}

/// Collect same-site links from the first `max_anchors` anchors of a page.
///
/// Links are absolute, fragment-free and normalized like seed URLs, in
/// document order without duplicates. Only anchors still attached under the
/// root element are considered.
pub fn discover_links(
    document: &Html,
    page_url: &Url,
    site: &Url,
    max_anchors: usize,
) -> Result<Vec<Url>, CrawlError> {
    let anchors = Selector::parse("a[href]")
        .map_err(|_| CrawlError::Selector("a[href]".to_string()))?;

    let mut links: Vec<Url> = Vec::new();
    for href in document
        .root_element()
        .select(&anchors)
        .take(max_anchors)
        .filter_map(|a| a.value().attr("href"))
    {
        let Some(link) = resolve_link(page_url, href) else {
            continue;
        };
        if same_site(&link, site) && !links.contains(&link) {
            links.push(link);
        }
    }

    debug!("Discovered {} same-site links on {}", links.len(), page_url);
    Ok(links)
}
