//! TravelKit CLI - collect city pages and per-country travel information

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use travelkit::{
    build_digest, collect_directory, country, extract_country_names, BatchReport, Config,
    ConfigBuilder, Endpoint, ItemOutcome, Pipeline, TravelError, CITY_DIGEST_FILE,
    DEFAULT_OUTPUT_ROOT, DIGEST_CATEGORY, NOMAD_DIR_NAME,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// TravelKit - travel data collector
#[derive(Parser, Debug)]
#[command(name = "travelkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// data.go.kr service key
    #[arg(long, env = "SERVICE_KEY", hide_env_values = true, global = true)]
    service_key: Option<String>,

    /// Root directory for fetched data
    #[arg(long, env = "TRAVELKIT_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Maximum concurrent requests per batch
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Delay before each city page request, in milliseconds
    #[arg(long, global = true)]
    pacing_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Print the batch report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the page of every configured city
    Cities {
        /// Cities to fetch instead of the configured list
        #[arg(long, value_delimiter = ',')]
        city: Vec<String>,
    },
    /// Parse the saved city pages into the city digest (output.json)
    Digest,
    /// Fetch embassy information for every country in the city digest
    Embassy,
    /// Fetch entrance visa information for every country in the city digest
    Visa,
    /// Fetch emergency contacts for every country in the city digest
    Emergency,
    /// Merge a category's per-country files into its output.json
    Collect {
        /// embassy, visa or emergency-contact
        category: Endpoint,
    },
    /// List the countries named in the city digest with their ISO codes
    Countries,
    /// Print the JSON schema of batch reports
    Schema,
}

#[tokio::main]
async fn main() {
    // Optional .env file in the working directory
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Error initializing logging: {}", e);
    }

    let result = match &cli.command {
        Commands::Schema => {
            print_json(&schemars::schema_for!(BatchReport));
            return;
        }
        Commands::Countries => {
            run_countries(&cli);
            return;
        }
        Commands::Cities { .. } => pipeline(&cli).fetch_city_pages().await,
        Commands::Embassy => pipeline(&cli).fetch_embassy_info().await,
        Commands::Visa => pipeline(&cli).fetch_visa_info().await,
        Commands::Emergency => pipeline(&cli).fetch_emergency_contacts().await,
        Commands::Digest => build_city_digest(&cli).await,
        Commands::Collect { category } => collect_category(&cli, *category).await,
    };

    match result {
        Ok(report) => print_report(&report, cli.json),
        Err(e) => fail(&e),
    }
}

/// Build the pipeline or exit; a missing service key is fatal
fn pipeline(cli: &Cli) -> Pipeline {
    let config = build_config(cli).unwrap_or_else(|e| fail(&e));
    tracing::debug!(
        output_root = %config.output_root.display(),
        concurrency = config.concurrency,
        timeout_secs = config.request_timeout.as_secs(),
        "Loaded configuration"
    );
    Pipeline::new(config).unwrap_or_else(|e| fail(&e))
}

/// Log to stderr; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("travelkit=info"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()?;
    }
    Ok(())
}

/// Environment first, then command line flags on top
fn build_config(cli: &Cli) -> Result<Config, TravelError> {
    let service_key = cli.service_key.clone();
    let mut builder: ConfigBuilder = Config::from_lookup(|name| match name {
        "SERVICE_KEY" => service_key.clone(),
        _ => std::env::var(name).ok(),
    })?;

    if let Some(dir) = &cli.output_dir {
        builder = builder.output_root(dir);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ms) = cli.pacing_ms {
        builder = builder.pacing(Duration::from_millis(ms));
    }
    if let Some(secs) = cli.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Commands::Cities { city } = &cli.command {
        if !city.is_empty() {
            builder = builder.cities(city.iter().cloned());
        }
    }

    builder.build()
}

fn output_root(cli: &Cli) -> PathBuf {
    cli.output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
}

fn nomad_dir(root: &Path) -> PathBuf {
    root.join(NOMAD_DIR_NAME)
}

/// Digest building only touches local files and needs no service key
async fn build_city_digest(cli: &Cli) -> Result<BatchReport, TravelError> {
    let (report, _) = build_digest(&nomad_dir(&output_root(cli)), DIGEST_CATEGORY).await?;
    Ok(report)
}

/// Collecting only touches local files and needs no service key
async fn collect_category(cli: &Cli, category: Endpoint) -> Result<BatchReport, TravelError> {
    let dir = output_root(cli).join(category.output_dir_name());
    let (report, _) = collect_directory(&dir, category.name()).await?;
    Ok(report)
}

/// The country listing needs no service key
fn run_countries(cli: &Cli) {
    let digest = nomad_dir(&output_root(cli)).join(CITY_DIGEST_FILE);

    match extract_country_names(&digest) {
        Ok(countries) => writeln_safe(&format_countries(&countries)),
        Err(e) => fail(&e),
    }
}

fn format_countries(countries: &[String]) -> String {
    countries
        .iter()
        .map(|name| format!("{}\t{}", country::alpha2(name).unwrap_or("--"), name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_report(report: &BatchReport, json: bool) {
    if json {
        print_json(report);
    } else {
        writeln_safe(&format_report(report));
    }
}

/// Human-readable report: one line per item that did not succeed, then totals
fn format_report(report: &BatchReport) -> String {
    let mut output = String::new();
    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Skipped { reason } => {
                output.push_str(&format!("skipped {}: {}\n", item.item, reason));
            }
            ItemOutcome::Failed { error } => {
                output.push_str(&format!("failed  {}: {}\n", item.item, error));
            }
            ItemOutcome::Saved { .. } | ItemOutcome::Collected { .. } => {}
        }
    }
    output.push_str(&format!(
        "{}: {} saved, {} skipped, {} failed",
        report.category,
        report.saved(),
        report.skipped(),
        report.failed()
    ));
    output
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        std::process::exit(1);
    });
    writeln_safe(&json);
}

fn fail(error: &TravelError) -> ! {
    eprintln!("Error: {}", error);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
