// src/main.rs
mod browser;
mod config;
mod database;
mod extractors;
mod models;
mod preprocess;
mod report;
mod storage;
mod utils;

use browser::HttpSession;
use clap::{Args, Parser, Subcommand};
use config::{SiteConfig, DEFAULT_CLEAN_PATH, DEFAULT_DB_PATH, DEFAULT_QUERY, DEFAULT_RAW_PATH, DEFAULT_TABLE};
use extractors::{scrape_search_results, ListingExtractor};
use preprocess::NormalizeSummary;
use report::RunReport;
use std::path::{Path, PathBuf};
use utils::error::ExtractError;
use utils::AppError;

/// Scrape retail search results, clean them and load them into SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the search results for a query into the raw CSV file
    Scrape {
        /// Search text to submit
        #[arg(default_value = DEFAULT_QUERY)]
        query: String,

        /// Raw CSV output path
        #[arg(short, long, default_value = DEFAULT_RAW_PATH)]
        output: PathBuf,

        #[command(flatten)]
        site: SiteArgs,
    },

    /// Clean the raw CSV file into the cleaned CSV file
    Preprocess {
        #[arg(short, long, default_value = DEFAULT_RAW_PATH)]
        input: PathBuf,

        #[arg(short, long, default_value = DEFAULT_CLEAN_PATH)]
        output: PathBuf,
    },

    /// Replace the products table with the cleaned CSV file
    Store {
        #[arg(short, long, default_value = DEFAULT_CLEAN_PATH)]
        input: PathBuf,

        /// SQLite database file
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
    },

    /// Print the stored products as JSON
    Show {
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,

        /// Print at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Run scrape, preprocess and store in sequence
    Pipeline {
        #[arg(default_value = DEFAULT_QUERY)]
        query: String,

        #[arg(long, default_value = DEFAULT_RAW_PATH)]
        raw: PathBuf,

        #[arg(long, default_value = DEFAULT_CLEAN_PATH)]
        clean: PathBuf,

        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,

        /// Log a failed stage and carry on with the next one instead of stopping
        #[arg(long)]
        best_effort: bool,

        /// Write a JSON summary of the run to this path
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Overrides for the target site (environment: SCRAPER_BASE_URL,
/// SCRAPER_USER_AGENT, SCRAPER_REQUEST_DELAY_MS)
#[derive(Args, Debug)]
struct SiteArgs {
    /// Landing page holding the search box
    #[arg(long)]
    base_url: Option<String>,

    /// id of the search input element
    #[arg(long)]
    search_input_id: Option<String>,

    /// Skip request pacing and settle pauses (local mirrors)
    #[arg(long)]
    no_delay: bool,
}

impl SiteArgs {
    fn into_config(self) -> SiteConfig {
        let mut config = SiteConfig::from_env();
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(id) = self.search_input_id {
            config.search_input_id = id;
        }
        if self.no_delay {
            config = config.without_delays();
        }
        config
    }
}

async fn run_scrape(site: &SiteConfig, query: &str, output: &Path) -> Result<usize, AppError> {
    let extractor = ListingExtractor::new(&site.selectors)?;
    let session = HttpSession::open(site).map_err(ExtractError::from)?;

    let rows = scrape_search_results(session, site, &extractor, query).await?;
    storage::write_raw_table(output, &rows)?;

    tracing::info!("Scraped data saved to {}", output.display());
    Ok(rows.len())
}

fn run_preprocess(input: &Path, output: &Path) -> Result<NormalizeSummary, AppError> {
    Ok(preprocess::preprocess_file(input, output)?)
}

fn run_store(input: &Path, db: &Path, table: &str) -> Result<usize, AppError> {
    Ok(database::store_in_database(input, db, table)?)
}

fn run_show(db: &Path, table: &str, limit: Option<usize>) -> Result<(), AppError> {
    let store = database::ProductStore::open(db)?;
    let mut rows = store.load_products(table)?;
    store.close()?;

    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Records a stage outcome. Returns the error only when the pipeline should stop.
fn settle_stage(
    report: &mut RunReport,
    stage: &'static str,
    outcome: Result<(usize, Option<serde_json::Value>), AppError>,
    best_effort: bool,
) -> Result<(), AppError> {
    match outcome {
        Ok((rows, detail)) => {
            report.succeeded(stage, rows, detail);
            Ok(())
        }
        Err(e) => {
            report.failed(stage, &e);
            if best_effort {
                tracing::error!("{} stage failed, continuing: {}", stage, e);
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

struct PipelinePaths {
    raw: PathBuf,
    clean: PathBuf,
    db: PathBuf,
    table: String,
}

async fn run_stages(
    report: &mut RunReport,
    site: &SiteConfig,
    query: &str,
    paths: &PipelinePaths,
    best_effort: bool,
) -> Result<(), AppError> {
    let scraped = run_scrape(site, query, &paths.raw).await.map(|n| (n, None));
    settle_stage(report, "scrape", scraped, best_effort)?;

    let cleaned = run_preprocess(&paths.raw, &paths.clean).and_then(|summary| {
        Ok((summary.rows_written, Some(serde_json::to_value(&summary)?)))
    });
    settle_stage(report, "preprocess", cleaned, best_effort)?;

    let stored = run_store(&paths.clean, &paths.db, &paths.table).map(|n| (n, None));
    settle_stage(report, "store", stored, best_effort)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Parsed arguments: {:?}", cli);

    let result = match cli.command {
        Command::Scrape { query, output, site } => {
            run_scrape(&site.into_config(), &query, &output).await.map(|_| ())
        }
        Command::Preprocess { input, output } => run_preprocess(&input, &output).map(|_| ()),
        Command::Store { input, db, table } => run_store(&input, &db, &table).map(|_| ()),
        Command::Show { db, table, limit } => run_show(&db, &table, limit),
        Command::Pipeline { query, raw, clean, db, table, best_effort, report: report_path, site } => {
            let site = site.into_config();
            let paths = PipelinePaths { raw, clean, db, table };
            let mut report = RunReport::start(&query);

            let outcome = run_stages(&mut report, &site, &query, &paths, best_effort).await;
            report.finish();
            if let Some(path) = report_path {
                report.save(&path)?;
            }

            let failures = report.failures();
            if outcome.is_ok() && failures > 0 {
                tracing::warn!("Pipeline finished with {} failed stage(s)", failures);
            } else if outcome.is_ok() {
                tracing::info!("Pipeline finished: {} stages succeeded", report.stages.len());
            }
            outcome
        }
    };

    if let Err(e) = &result {
        tracing::error!("Run failed: {}", e);
    }
    result
}
