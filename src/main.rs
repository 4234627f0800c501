//! # Curator CLI Application
//!
//! Command-line front end for the crawl and extraction pipeline.
//!
//! - `crawl`: crawl one or more sites and save the accepted text
//! - `extract`: turn a text file into question/answer records
//! - `artifacts`: list saved crawl artifacts
//!
//! The extraction service and the semantic classifier use the OpenAI API key
//! from `OPENAI_API_KEY`. Without it, crawls run with the heuristic signal only.

mod telemetry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use curator::crawler::{CrawlRequest, Crawler, CrawlerConfig, FileSink, OutputSink};
use curator::model::{OpenAiCompletionModel, openai_from_env};
use curator::processor::{ExtractionOutcome, Extractor, ProcessorConfig, QARecord};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Crawl web pages and extract sourced Q&A training records", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a site and save the accepted page text
    Crawl(CrawlArgs),

    /// Extract Q&A records from a text file
    Extract(ExtractArgs),

    /// List saved crawl artifacts
    Artifacts(ArtifactsArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Seed URLs; each is crawled in turn with the same settings
    #[arg(required = true, num_args = 1..)]
    urls: Vec<String>,

    /// Maximum number of pages per seed
    #[arg(short, long, default_value = "1")]
    pages: usize,

    /// Keep only on-topic pages
    #[arg(short, long)]
    topic_only: bool,

    /// Do not consult the semantic classifier
    #[arg(long)]
    no_classifier: bool,

    /// Directory for saved artifacts
    #[arg(short, long, default_value = curator::crawler::storage::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Extract Q&A records from the crawled text
    #[arg(short, long)]
    extract: bool,

    /// Only extract records with a verifiable source and reference
    #[arg(short, long, requires = "extract")]
    strict: bool,

    /// Write extracted records to this file instead of stdout
    #[arg(short, long, requires = "extract")]
    records: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Text file to extract from
    #[arg(required = true)]
    file: PathBuf,

    /// Only extract records with a verifiable source and reference
    #[arg(short, long)]
    strict: bool,

    /// Write the output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write chat-format training examples as JSON lines
    #[arg(short, long)]
    training: bool,
}

#[derive(Args, Debug)]
struct ArtifactsArgs {
    /// Directory holding saved artifacts
    #[arg(short, long, default_value = curator::crawler::storage::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Crawl(args) => crawl_command(args).await?,
        Commands::Extract(args) => extract_command(args).await?,
        Commands::Artifacts(args) => artifacts_command(args).await?,
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}") {
        progress_bar.set_style(style);
    }
    progress_bar.set_message(message.to_string());
    progress_bar.enable_steady_tick(Duration::from_millis(120));
    progress_bar
}

async fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved output to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn records_json(records: &[QARecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn training_jsonl(records: &[QARecord]) -> anyhow::Result<String> {
    let lines = records
        .iter()
        .map(|r| serde_json::to_string(&r.to_training_example()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

async fn run_extraction(
    model: OpenAiCompletionModel,
    text: &str,
    strict: bool,
) -> ExtractionOutcome {
    let extractor = Extractor::new(model, ProcessorConfig::default());
    let progress_bar = spinner("Extracting Q&A records...");
    let outcome = extractor.extract_records(text, strict).await;
    progress_bar.finish_and_clear();
    outcome
}

#[instrument(skip_all)]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let model = match openai_from_env() {
        Ok(model) => Some(model),
        Err(e) => {
            if !args.no_classifier || args.extract {
                warn!("{}; continuing with the heuristic signal only", e);
            }
            None
        }
    };
    if args.extract && model.is_none() {
        return Err(anyhow!("Extraction needs an API key in OPENAI_API_KEY"));
    }

    let crawler = Crawler::new(
        CrawlerConfig::default(),
        model.clone(),
        FileSink::new(&args.output_dir),
    )?;

    let template = CrawlRequest::new("")
        .page_budget(args.pages)
        .topic_only(args.topic_only)
        .classifier_enabled(!args.no_classifier);

    let progress_bar = spinner(&format!("Crawling {} seed(s)...", args.urls.len()));
    let reports = crawler.crawl_many(&args.urls, &template).await;
    progress_bar.finish_and_clear();

    let mut combined = String::new();
    for (url, report) in args.urls.iter().zip(&reports) {
        println!("{}", url);
        println!("{}", report.message);
        for skipped in &report.skipped {
            println!("  skipped {}: {}", skipped.url, skipped.reason);
        }
        if report.success {
            combined.push_str(&report.content);
        }
    }

    if !reports.iter().any(|r| r.success) {
        return Err(anyhow!("No seed produced content"));
    }

    if let Some(model) = model.filter(|_| args.extract) {
        let outcome = run_extraction(model, &combined, args.strict).await;
        println!("{}", outcome.message);
        if outcome.success {
            write_output(args.records.as_deref(), &records_json(&outcome.records)?).await?;
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(file = %args.file.display()))]
async fn extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let model = openai_from_env()?;
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let outcome = run_extraction(model, &text, args.strict).await;
    println!("{}", outcome.message);
    if !outcome.success {
        return Err(anyhow!("Extraction failed"));
    }

    let output = if args.training {
        training_jsonl(&outcome.records)?
    } else {
        records_json(&outcome.records)?
    };
    write_output(args.output.as_deref(), &output).await
}

#[instrument(skip_all)]
async fn artifacts_command(args: ArtifactsArgs) -> anyhow::Result<()> {
    let sink = FileSink::new(&args.output_dir);
    let artifacts = sink.list().await?;

    println!("Saved artifacts: {}", artifacts.len());
    for artifact in artifacts {
        println!(
            "{} - {} bytes (modified {})",
            artifact.handle.name,
            artifact.size,
            artifact.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
