//! # metascrape CLI
//!
//! Command-line front end for the metascrape library.
//!
//! - `scrape`: Extract metadata from one URL
//! - `batch`: Extract metadata from several URLs, in order
//!
//! Results are printed as text or JSON; collected errors go to stderr in text
//! mode and into the `errors` field in JSON mode.

mod telemetry;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use metascrape::scraper::{ScrapeOutcome, ScraperConfig};
use metascrape::{BatchEntry, BatchScraper, ScrapeResult, Scraper};
use std::path::PathBuf;
use std::time::Duration;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Extract OpenGraph properties, title and images from web pages", long_about = None)]
struct Cli {
    /// Also write logs to a file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape a single URL
    Scrape(ScrapeArgs),

    /// Scrape several URLs
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// URL to scrape
    #[arg(required = true)]
    url: String,

    #[command(flatten)]
    options: ScrapeOptions,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// URLs to scrape
    #[arg(required = true)]
    urls: Vec<String>,

    /// Number of pages scraped at once
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    #[command(flatten)]
    options: ScrapeOptions,
}

#[derive(Args, Debug)]
struct ScrapeOptions {
    /// Only report og: meta tags
    #[arg(long)]
    og_only: bool,

    /// Download every image to measure its size and type
    #[arg(short, long)]
    deep: bool,

    /// Measure images through temp files instead of in memory
    #[arg(long)]
    save_temp_image: bool,

    /// Directory for temp image files
    #[arg(long, default_value = "./tmp")]
    temp_dir: PathBuf,

    /// Minimum image width
    #[arg(long, default_value = "5")]
    min_width: u32,

    /// Minimum image height
    #[arg(long, default_value = "5")]
    min_height: u32,

    /// Total request timeout in seconds
    #[arg(short, long, default_value = "45")]
    timeout: u64,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

impl ScrapeOptions {
    fn config(&self) -> ScraperConfig {
        ScraperConfig::builder()
            .scrape_open_graph_only(self.og_only)
            .deep_image_inspection(self.deep)
            .save_temp_image(self.save_temp_image)
            .temp_image_dir(self.temp_dir.clone())
            .min_image_size(self.min_width, self.min_height)
            .timeout_secs(self.timeout)
            .build()
    }

    fn json(&self) -> bool {
        self.format == "json"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    match cli.command {
        Some(Commands::Scrape(args)) => {
            scrape_command(args).await?;
        }
        Some(Commands::Batch(args)) => {
            batch_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["metascrape", "--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let mut scraper = Scraper::with_config(&args.url, args.options.config())?;
    scraper.scrape().await;
    let outcome = scraper.into_outcome();

    if args.options.json() {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
    } else {
        println!("Scraping {}...\n", outcome.url);
        print_result(&outcome.result);
        print_errors(&outcome.error_messages());
    }

    Ok(())
}

#[instrument]
async fn batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let config = ScraperConfig {
        batch_concurrency: args.concurrency,
        ..args.options.config()
    };
    let batch = BatchScraper::with_config(args.urls.clone(), config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Scraping {} URLs...", batch.urls().len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let entries = batch.scrape_all().await;
    spinner.finish_and_clear();

    if args.options.json() {
        let json: Vec<_> = entries.iter().map(entry_json).collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for (i, entry) in entries.iter().enumerate() {
            println!("{}. {}", i + 1, entry.url);
            print_result(&entry.properties);
            let messages: Vec<String> = entry.errors.iter().map(ToString::to_string).collect();
            print_errors(&messages);
            println!();
        }
    }

    Ok(())
}

fn outcome_json(outcome: &ScrapeOutcome) -> serde_json::Value {
    serde_json::json!({
        "url": outcome.url,
        "properties": outcome.result,
        "errors": outcome.error_messages(),
    })
}

fn entry_json(entry: &BatchEntry) -> serde_json::Value {
    serde_json::json!({
        "url": entry.url,
        "properties": entry.properties,
        "errors": entry.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn print_result(result: &ScrapeResult) {
    for (key, value) in result.properties.iter() {
        println!("   {}: {}", key, value);
    }
    if let Some(title) = &result.title {
        println!("   Title: {}", title);
    }
    if let Some(images) = &result.images {
        println!("   Images: {}", images.len());
        for image in images {
            print!("     {} ({}x{})", image.url, image.width, image.height);
            if let Some(mime) = &image.mime_type {
                print!(" {}", mime);
            }
            if let Some(description) = &image.description {
                print!(" \"{}\"", description);
            }
            println!();
        }
    }
}

fn print_errors(errors: &[String]) {
    for error in errors {
        eprintln!("   Error: {}", error);
    }
}
