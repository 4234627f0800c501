//! The fetch, extract, classify and persist loop

use std::fmt;

use chrono::{DateTime, Local};
use rig::completion::CompletionModel;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::content_extraction::{ExtractedPage, extract_content, parse_html};
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::{FetchOutcome, Fetcher, normalize_url};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::discover_links;
use crate::crawler::storage::{ArtifactHandle, OutputSink};
use crate::crawler::{CrawlRequest, CrawlerConfig};
use crate::relevance::{RelevanceClassifier, RelevanceVerdict};

const PAGE_SEPARATOR_WIDTH: usize = 80;

const NO_CONTENT_MESSAGE: &str = "No content could be extracted from the URL(s). The page might not exist, be blocked, or contain no meaningful content.";

/// Why a URL contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    NotFound,
    Forbidden,
    HttpStatus(u16),
    WrongContentType(String),
    FetchFailed(String),
    ParseFailed(String),
    /// Extracted text had this many characters, not more than the minimum
    TooShort(usize),
    /// Classifier reported low quality with this confidence
    LowQuality(f64),
    OffTopic,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "page not found (404)"),
            SkipReason::Forbidden => write!(f, "access forbidden (403)"),
            SkipReason::HttpStatus(code) => write!(f, "HTTP {}", code),
            SkipReason::WrongContentType(ct) => write!(f, "non-HTML content: {}", ct),
            SkipReason::FetchFailed(reason) => write!(f, "request failed: {}", reason),
            SkipReason::ParseFailed(reason) => write!(f, "could not parse page: {}", reason),
            SkipReason::TooShort(chars) => write!(f, "too little content ({} characters)", chars),
            SkipReason::LowQuality(confidence) => {
                write!(f, "low-quality content (confidence {:.2})", confidence)
            }
            SkipReason::OffTopic => write!(f, "off-topic content"),
        }
    }
}

impl SkipReason {
    fn from_fetch(outcome: FetchOutcome) -> Option<Self> {
        match outcome {
            FetchOutcome::Success(_) => None,
            FetchOutcome::NotFound => Some(SkipReason::NotFound),
            FetchOutcome::Forbidden => Some(SkipReason::Forbidden),
            FetchOutcome::HttpStatus(code) => Some(SkipReason::HttpStatus(code)),
            FetchOutcome::WrongContentType(ct) => Some(SkipReason::WrongContentType(ct)),
            FetchOutcome::Failed(reason) => Some(SkipReason::FetchFailed(reason)),
        }
    }
}

/// A URL that contributed nothing, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub url: String,
    pub reason: SkipReason,
}

/// Aggregate statistics over the accepted pages of a crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages whose text went into the report
    pub pages_accepted: usize,

    /// URLs fetched
    pub pages_visited: usize,

    /// URLs that contributed nothing
    pub pages_skipped: usize,

    /// Characters in the combined text
    pub total_chars: usize,

    /// Mean heuristic keyword ratio of accepted pages
    pub average_heuristic_score: f64,

    pub quran_references: usize,

    pub hadith_references: usize,

    /// Whether the semantic classifier was consulted
    pub classifier_enabled: bool,

    /// Mean classifier confidence of accepted pages, when it ran
    pub average_classifier_confidence: Option<f64>,

    /// Whether any accepted page was individually on topic
    pub on_topic: bool,
}

/// Result of one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub success: bool,

    /// Human-readable summary or diagnostic
    pub message: String,

    /// Combined text of every accepted page, with metadata headers
    pub content: String,

    pub stats: CrawlStats,

    /// Where the combined text was persisted
    pub artifact: Option<ArtifactHandle>,

    /// URLs that contributed nothing
    pub skipped: Vec<SkippedPage>,
}

impl CrawlReport {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            content: String::new(),
            stats: CrawlStats::default(),
            artifact: None,
            skipped: Vec::new(),
        }
    }
}

/// Working state of one crawl
#[derive(Debug, Default)]
struct CrawlAccumulator {
    pages: Vec<String>,
    skipped: Vec<SkippedPage>,
    total_heuristic_score: f64,
    quran_references: usize,
    hadith_references: usize,
    classifier_confidences: Vec<f64>,
    any_on_topic: bool,
}

impl CrawlAccumulator {
    fn accepted(&self) -> usize {
        self.pages.len()
    }

    fn skip(&mut self, url: &Url, reason: SkipReason) {
        warn!("Skipping {}: {}", url, reason);
        self.skipped.push(SkippedPage {
            url: url.to_string(),
            reason,
        });
    }

    fn accept(&mut self, url: &Url, text: &str, verdict: &RelevanceVerdict, at: DateTime<Local>) {
        let mut header = format!(
            "\nURL: {}\nScraped: {}\nContent Length: {} characters\n",
            url,
            at.format("%Y-%m-%d %H:%M:%S"),
            text.chars().count()
        );
        if let Some(semantic) = &verdict.semantic {
            header.push_str(&format!("AI Quality Score: {:.2}\n", semantic.confidence));
            header.push_str(&format!("AI Summary: {}\n", semantic.summary));
            self.classifier_confidences.push(semantic.confidence);
        }
        header.push_str(&format!("Islamic Score: {:.1}%\n", verdict.heuristic_score));
        header.push_str(&format!("Quran References: {}\n", verdict.quran_references));
        header.push_str(&format!("Hadith References: {}\n", verdict.hadith_references));
        header.push_str("---\n\n");

        self.pages.push(header + text);
        self.total_heuristic_score += verdict.heuristic_score;
        self.quran_references += verdict.quran_references;
        self.hadith_references += verdict.hadith_references;
        self.any_on_topic |= verdict.is_on_topic;
    }

    /// Combined text and statistics
    fn finish(&self, pages_visited: usize, classifier_enabled: bool) -> (String, CrawlStats) {
        let separator = format!("\n\n{}\n\n", "=".repeat(PAGE_SEPARATOR_WIDTH));
        let content: String = self
            .pages
            .iter()
            .map(|page| format!("{}{}", separator, page))
            .collect();

        let accepted = self.accepted();
        let average_heuristic_score = if accepted == 0 {
            0.0
        } else {
            self.total_heuristic_score / accepted as f64
        };
        let average_classifier_confidence = (!self.classifier_confidences.is_empty()).then(|| {
            self.classifier_confidences.iter().sum::<f64>()
                / self.classifier_confidences.len() as f64
        });

        let stats = CrawlStats {
            pages_accepted: accepted,
            pages_visited,
            pages_skipped: self.skipped.len(),
            total_chars: content.chars().count(),
            average_heuristic_score,
            quran_references: self.quran_references,
            hadith_references: self.hadith_references,
            classifier_enabled,
            average_classifier_confidence,
            on_topic: self.any_on_topic,
        };
        (content, stats)
    }
}

/// File name for a crawl artifact: `scraped_{host}_{timestamp}.txt`
pub fn artifact_name(seed: &Url, at: DateTime<Local>) -> String {
    let mut site = seed.host_str().unwrap_or("unknown").to_string();
    if let Some(port) = seed.port() {
        site.push_str(&format!("_{}", port));
    }
    format!(
        "scraped_{}_{}.txt",
        site.replace(['.', ':'], "_"),
        at.format("%Y%m%d_%H%M%S")
    )
}

fn success_message(stats: &CrawlStats, artifact: &ArtifactHandle) -> String {
    let mode = if stats.classifier_enabled {
        "classifier-assisted"
    } else {
        "heuristic only"
    };
    let mut message = format!(
        "Successfully scraped {} page(s) ({})\n\
         Content saved to: {}\n\
         Total content length: {} characters\n\
         Average topic score: {:.1}%\n\
         Quran references found: {}\n\
         Hadith references found: {}\n",
        stats.pages_accepted,
        mode,
        artifact.name,
        stats.total_chars,
        stats.average_heuristic_score,
        stats.quran_references,
        stats.hadith_references,
    );
    if let Some(confidence) = stats.average_classifier_confidence {
        message.push_str(&format!("Average classifier quality score: {:.2}\n", confidence));
    }
    message
}

/// Crawls a site from a seed URL and persists the accepted text
#[derive(Debug)]
pub struct Crawler<M, S> {
    config: CrawlerConfig,
    fetcher: Fetcher,
    classifier: RelevanceClassifier<M>,
    sink: S,
}

impl<M: CompletionModel, S: OutputSink> Crawler<M, S> {
    /// Create a crawler. Without a model only the heuristic signal runs.
    pub fn new(config: CrawlerConfig, model: Option<M>, sink: S) -> crate::Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        let classifier = RelevanceClassifier::new(model, config.relevance.clone());
        Ok(Self {
            config,
            fetcher,
            classifier,
            sink,
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// The sink artifacts are persisted to
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Crawl from `request.seed_url`.
    ///
    /// Never fails: invalid input, an empty crawl and a failed write all
    /// produce a report with `success == false`.
    #[instrument(skip_all, fields(seed = %request.seed_url, budget = request.page_budget))]
    pub async fn crawl(&self, request: &CrawlRequest) -> CrawlReport {
        let seed = match normalize_url(&request.seed_url) {
            Ok(seed) => seed,
            Err(e) => return CrawlReport::failure(format!("Invalid URL provided: {}", e)),
        };
        if request.page_budget == 0 {
            return CrawlReport::failure("Page budget must be at least 1");
        }

        info!("Starting crawl of {}", seed);
        let classifier_enabled = request.classifier_enabled && self.classifier.has_model();
        let mut frontier = Frontier::new(seed.clone(), request.page_budget);
        let mut acc = CrawlAccumulator::default();

        while let Some(url) = frontier.pop() {
            if acc.accepted() >= request.page_budget {
                break;
            }
            if !frontier.mark_visited(&url) {
                continue;
            }

            self.process_page(&url, &seed, request, &mut frontier, &mut acc)
                .await;
            sleep(self.config.page_delay).await;
        }

        let (content, stats) = acc.finish(frontier.visited_count(), classifier_enabled);
        let skipped = std::mem::take(&mut acc.skipped);

        if stats.pages_accepted == 0 {
            warn!("Crawl of {} produced no content", seed);
            return CrawlReport {
                stats,
                skipped,
                ..CrawlReport::failure(NO_CONTENT_MESSAGE)
            };
        }

        let name = artifact_name(&seed, Local::now());
        match self.sink.persist(&name, &content).await {
            Ok(artifact) => {
                info!(
                    pages = stats.pages_accepted,
                    chars = stats.total_chars,
                    "Crawl complete, saved {}",
                    artifact.name
                );
                CrawlReport {
                    success: true,
                    message: success_message(&stats, &artifact),
                    content,
                    stats,
                    artifact: Some(artifact),
                    skipped,
                }
            }
            Err(e) => {
                warn!("Failed to persist {}: {}", name, e);
                CrawlReport {
                    success: false,
                    message: format!("Failed to save crawl output: {}", e),
                    content,
                    stats,
                    artifact: None,
                    skipped,
                }
            }
        }
    }

    /// Crawl several seeds in order with the same budget and flags, pausing
    /// between seeds. Returns one report per seed.
    pub async fn crawl_many(&self, seeds: &[String], template: &CrawlRequest) -> Vec<CrawlReport> {
        let mut reports = Vec::with_capacity(seeds.len());
        for (i, seed) in seeds.iter().enumerate() {
            if i > 0 {
                sleep(self.config.seed_delay).await;
            }
            let request = CrawlRequest {
                seed_url: seed.clone(),
                ..template.clone()
            };
            reports.push(self.crawl(&request).await);
        }
        reports
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn process_page(
        &self,
        url: &Url,
        site: &Url,
        request: &CrawlRequest,
        frontier: &mut Frontier,
        acc: &mut CrawlAccumulator,
    ) {
        let result = match self.fetcher.fetch(url).await {
            FetchOutcome::Success(result) => result,
            other => {
                if let Some(reason) = SkipReason::from_fetch(other) {
                    acc.skip(url, reason);
                }
                return;
            }
        };
        let fetched_at = Local::now();

        let body = result.body.unwrap_or_default();
        let want_links = frontier.remaining_capacity() > 0;
        let (page, links) = match self.parse_page(&result.final_url, &body, site, want_links) {
            Ok(parsed) => parsed,
            Err(e) => {
                acc.skip(url, SkipReason::ParseFailed(e.to_string()));
                return;
            }
        };

        let queued = frontier.extend(links);
        if queued > 0 {
            debug!("Queued {} new links", queued);
        }

        let text = page.text();
        let chars = text.trim().chars().count();
        if chars <= self.config.min_page_chars {
            acc.skip(url, SkipReason::TooShort(chars));
            return;
        }

        let verdict = self
            .classifier
            .classify(&text, request.classifier_enabled)
            .await;
        if !verdict.passes_quality_gate() {
            acc.skip(url, SkipReason::LowQuality(verdict.confidence));
            return;
        }
        if request.topic_only && !verdict.is_on_topic {
            acc.skip(url, SkipReason::OffTopic);
            return;
        }

        info!("Accepted {} ({} characters)", url, chars);
        acc.accept(url, &text, &verdict, fetched_at);
    }

    /// Parse, extract and discover links in one synchronous step
    fn parse_page(
        &self,
        page_url: &Url,
        body: &[u8],
        site: &Url,
        want_links: bool,
    ) -> Result<(ExtractedPage, Vec<Url>), CrawlError> {
        let mut document = parse_html(body)?;
        let page = extract_content(&mut document, page_url, &self.config)?;
        let links = if want_links {
            discover_links(&document, page_url, site, self.config.max_links_per_page)?
        } else {
            Vec::new()
        };
        Ok((page, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::storage::{MemorySink, StorageError};
    use crate::model::MockCompletionModel;
    use mockito::Server;
    use std::time::Duration;

    const ON_TOPIC_PAGE: &str = r#"<html><head><title>Five Pillars</title></head><body><main>
        <p>The five pillars of Islam are Shahada, Salah, Zakat, Sawm and Hajj.</p>
        <p>Every Muslim is taught these practices of worship from an early age.</p>
        <a href="/garden">Garden</a>
        </main></body></html>"#;

    const OFF_TOPIC_PAGE: &str = r#"<html><body><main>
        <p>Our garden centre stocks tools, seeds, compost and planters for every season.</p>
        <p>Visit the store on weekends for workshops about growing vegetables at home.</p>
        </main></body></html>"#;

    fn test_config() -> CrawlerConfig {
        CrawlerConfig::builder()
            .page_delay(Duration::ZERO)
            .seed_delay(Duration::ZERO)
            .build()
    }

    fn crawler(model: Option<MockCompletionModel>) -> Crawler<MockCompletionModel, MemorySink> {
        Crawler::new(test_config(), model, MemorySink::new()).unwrap()
    }

    async fn serve(server: &mut Server, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(body)
            .create_async()
            .await
    }

    /// Sink whose writes always fail
    struct FailingSink;

    impl OutputSink for FailingSink {
        async fn persist(&self, _name: &str, _content: &str) -> Result<ArtifactHandle, StorageError> {
            Err(StorageError::InvalidName("disk full".to_string()))
        }

        async fn list(&self) -> Result<Vec<crate::crawler::storage::ArtifactInfo>, StorageError> {
            Ok(Vec::new())
        }

        async fn read(&self, name: &str) -> Result<String, StorageError> {
            Err(StorageError::NotFound(name.to_string()))
        }
    }

    #[test]
    fn test_artifact_name() {
        let at = Local::now();
        let seed = Url::parse("https://sunnah.example.com/path").unwrap();
        let name = artifact_name(&seed, at);

        assert!(name.starts_with("scraped_sunnah_example_com_"));
        assert!(name.ends_with(".txt"));

        let seed = Url::parse("http://127.0.0.1:8080").unwrap();
        assert!(artifact_name(&seed, at).starts_with("scraped_127_0_0_1_8080_"));
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::NotFound.to_string(), "page not found (404)");
        assert_eq!(SkipReason::HttpStatus(502).to_string(), "HTTP 502");
        assert_eq!(
            SkipReason::LowQuality(0.9).to_string(),
            "low-quality content (confidence 0.90)"
        );
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_before_network() {
        let model = MockCompletionModel::new();
        let crawler = crawler(Some(model.clone()));

        let report = crawler.crawl(&CrawlRequest::new("   ")).await;
        assert!(!report.success);
        assert!(report.message.starts_with("Invalid URL provided"));
        assert_eq!(report.stats.pages_visited, 0);
        assert_eq!(model.calls(), 0);
        assert!(crawler.sink().is_empty().await);
    }

    #[test]
    fn test_invalid_header_fails_construction() {
        let config = CrawlerConfig::builder().user_agent("bad\nagent").build();
        let result = Crawler::<MockCompletionModel, _>::new(config, None, MemorySink::new());

        assert!(matches!(result, Err(crate::Error::Crawl(msg)) if msg.contains("header")));
    }

    #[tokio::test]
    async fn test_zero_budget_fails() {
        let report = crawler(None)
            .crawl(&CrawlRequest::new("https://example.com").page_budget(0))
            .await;
        assert!(!report.success);
        assert!(report.message.contains("at least 1"));
    }

    #[tokio::test]
    async fn test_single_page_crawl() {
        let mut server = Server::new_async().await;
        let seed = serve(&mut server, "/", ON_TOPIC_PAGE).await;

        let crawler = crawler(None);
        let report = crawler
            .crawl(&CrawlRequest::new(server.url()).classifier_enabled(false))
            .await;

        assert!(report.success, "{}", report.message);
        assert_eq!(report.stats.pages_accepted, 1);
        assert_eq!(report.stats.pages_visited, 1);
        assert!(report.stats.on_topic);
        assert!(report.stats.average_classifier_confidence.is_none());
        assert!(report.content.contains(&"=".repeat(80)));
        assert!(report.content.contains("Title: Five Pillars"));
        assert!(report.content.contains("Quran References: 0"));
        assert!(!report.content.contains("AI Summary"));

        let artifact = report.artifact.unwrap();
        assert!(report.message.contains(&artifact.name));
        assert_eq!(crawler.sink().read(&artifact.name).await.unwrap(), report.content);
        seed.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_seed_reports_failure() {
        let mut server = Server::new_async().await;
        let _missing = server.mock("GET", "/").with_status(404).create_async().await;

        let report = crawler(None).crawl(&CrawlRequest::new(server.url())).await;

        assert!(!report.success);
        assert_eq!(report.message, NO_CONTENT_MESSAGE);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NotFound);
        assert!(report.artifact.is_none());
    }

    #[tokio::test]
    async fn test_topic_only_skips_off_topic_page() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", OFF_TOPIC_PAGE).await;

        let request = CrawlRequest::new(server.url()).topic_only(true);
        let report = crawler(None).crawl(&request).await;
        assert!(!report.success);
        assert_eq!(report.skipped[0].reason, SkipReason::OffTopic);

        let report = crawler(None).crawl(&request.topic_only(false)).await;
        assert!(report.success);
        assert!(!report.stats.on_topic);
    }

    #[tokio::test]
    async fn test_confident_low_quality_page_is_rejected() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", ON_TOPIC_PAGE).await;

        let model = MockCompletionModel::new();
        model
            .push_text("```json\n{\"is_quality\": false, \"is_islamic\": true, \"confidence\": 0.9, \"summary\": \"ad\"}\n```")
            .await;

        let report = crawler(Some(model.clone()))
            .crawl(&CrawlRequest::new(server.url()))
            .await;

        assert!(!report.success);
        assert_eq!(report.skipped[0].reason, SkipReason::LowQuality(0.9));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_fails_open() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", ON_TOPIC_PAGE).await;

        let model = MockCompletionModel::new();
        model.push_error("service unavailable").await;

        let report = crawler(Some(model))
            .crawl(&CrawlRequest::new(server.url()).topic_only(true))
            .await;

        assert!(report.success, "{}", report.message);
        assert!(report.content.contains("AI Summary: Classifier error"));
        assert_eq!(report.stats.average_classifier_confidence, Some(0.2));
        assert!(report.message.contains("classifier-assisted"));
    }

    #[tokio::test]
    async fn test_too_short_page_is_skipped() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", "<html><body><p>Assalamu alaikum</p></body></html>").await;

        let report = crawler(None).crawl(&CrawlRequest::new(server.url())).await;
        assert!(!report.success);
        assert!(matches!(report.skipped[0].reason, SkipReason::TooShort(_)));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_content() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", ON_TOPIC_PAGE).await;

        let crawler: Crawler<MockCompletionModel, FailingSink> =
            Crawler::new(test_config(), None, FailingSink).unwrap();
        let report = crawler.crawl(&CrawlRequest::new(server.url())).await;

        assert!(!report.success);
        assert!(report.message.starts_with("Failed to save crawl output"));
        assert!(report.content.contains("Five Pillars"));
        assert!(report.artifact.is_none());
    }

    #[tokio::test]
    async fn test_crawl_many_returns_report_per_seed() {
        let mut server = Server::new_async().await;
        let _seed = serve(&mut server, "/", ON_TOPIC_PAGE).await;
        let _missing = server.mock("GET", "/gone").with_status(404).create_async().await;

        let seeds = vec![server.url(), format!("{}/gone", server.url())];
        let reports = crawler(None)
            .crawl_many(&seeds, &CrawlRequest::new(""))
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports[0].success);
        assert!(!reports[1].success);
    }
}
