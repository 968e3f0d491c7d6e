use anyhow::Result;
use cinerank::pipeline::{self, PipelineConfig, Report};
use cinerank_acquire::fetch::{DEFAULT_TIMEOUT, DEFAULT_URL, DEFAULT_USER_AGENT};
use cinerank_acquire::FetchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cinerank")]
#[command(about = "Scrape, clean, and chart the IMDb top-rated movies list")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Directory holding the checkpoint tables and chart images
    #[arg(short = 'O', long, global = true, env = "CINERANK_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, clean, and report in one pass
    Run {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Fetch the listing into the raw checkpoint (falls back to the existing one)
    Fetch {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Clean the raw checkpoint into the cleaned checkpoint
    Clean,

    /// Print summary statistics and render charts from the cleaned checkpoint
    Report,
}

#[derive(Args)]
struct FetchArgs {
    /// Listing page to scrape
    #[arg(long, env = "CINERANK_URL", default_value = DEFAULT_URL)]
    url: String,

    /// User-Agent header sent with the request
    #[arg(long, env = "CINERANK_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Request timeout in seconds
    #[arg(long, env = "CINERANK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

impl From<FetchArgs> for FetchConfig {
    fn from(args: FetchArgs) -> Self {
        FetchConfig {
            url: args.url,
            user_agent: args.user_agent,
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

/// Log lines carry millisecond timestamps with the offset, e.g.
/// `2026-10-18 09:41:07.512 +02:00`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

impl LogLevel {
    /// Filter applied when `RUST_LOG` is unset. Selector matching and the
    /// HTML tokenizer stay at warn so debug output shows cinerank's own events.
    fn directives(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
            LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
        }
    }
}

fn init_tracing(log_level: &LogLevel, utc: bool) {
    use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc};
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.directives()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if utc {
        subscriber
            .with_timer(ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .init();
    } else {
        subscriber
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .init();
    }
}

fn print_report(report: &Report) {
    match &report.description {
        Some(description) => {
            println!("Cleaned Data Summary:");
            println!("{description}");
        }
        None => println!("Cleaned Data Summary: no movies"),
    }
    println!("Total movies: {}", report.total);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.utc);

    let output_dir = cli.output_dir;
    match cli.command {
        Commands::Run { fetch } => {
            let config = PipelineConfig::new(&output_dir, fetch.into());
            tracing::info!(output_dir = %output_dir.display(), "Running full pipeline");
            let summary = pipeline::run(&config).await?;
            tracing::info!(
                raw = summary.raw_rows,
                cleaned = summary.cleaned.len(),
                charts = summary.report.charts.written.len(),
                "Pipeline finished"
            );
            print_report(&summary.report);
        }
        Commands::Fetch { fetch } => {
            let config = PipelineConfig::new(&output_dir, fetch.into());
            let acquired = pipeline::fetch(&config).await?;
            if let Some(report) = acquired.report {
                tracing::info!(
                    containers = report.containers,
                    extracted = report.extracted,
                    missing_title = report.missing_title,
                    malformed_rank = report.malformed_rank,
                    malformed_rating = report.malformed_rating,
                    malformed_votes = report.malformed_votes,
                    "Extraction summary"
                );
            }
        }
        Commands::Clean => {
            let config = PipelineConfig::new(&output_dir, FetchConfig::default());
            let cleaned = pipeline::clean(&config)?;
            tracing::info!(rows = cleaned.len(), "Wrote cleaned checkpoint");
        }
        Commands::Report => {
            let config = PipelineConfig::new(&output_dir, FetchConfig::default());
            let report = pipeline::report_from_checkpoint(&config)?;
            print_report(&report);
        }
    }

    Ok(())
}
