use std::sync::Arc;
use std::time::Duration;

use analysis_core::{AnalysisBackend, Company};
use analysis_orchestrator::{AnalysisOrchestrator, SearchService, Stage};
use anyhow::{bail, Context, Result};
use api_client::{ApiClient, ClientConfig};
use clap::{Parser, Subcommand, ValueEnum};
use result_classifier::sort_batch;

mod render;

use render::{JsonRenderer, Renderer, TextRenderer};

#[derive(Parser)]
#[command(name = "incrolink", version, about = "Company financial analysis from the terminal")]
struct Cli {
    /// Analysis service base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds (overrides API_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the analysis service is reachable
    Health,
    /// Search companies by name
    Search { query: String },
    /// Run the three-frame analysis for a company
    Analyze {
        query: String,
        /// Index into the search results
        #[arg(long, default_value_t = 0)]
        pick: usize,
    },
    /// Value every search match in one batch and rank them
    Screen { query: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    tracing::debug!("Using analysis service at {}", config.base_url);

    let client = Arc::new(ApiClient::new(config)?);
    let renderer: Box<dyn Renderer> = match cli.format {
        OutputFormat::Text => Box::new(TextRenderer),
        OutputFormat::Json => Box::new(JsonRenderer),
    };

    match cli.command {
        Command::Health => {
            let health = client.health().await.context("Health check failed")?;
            println!("{}", renderer.health(&health));
        }
        Command::Search { query } => {
            let search = SearchService::new(client.clone());
            search.search(&query).await;
            println!("{}", renderer.search(&search.snapshot()));
        }
        Command::Analyze { query, pick } => {
            let company = select_company(client.clone(), &query, pick).await?;
            analyze(client, company, renderer.as_ref()).await?;
        }
        Command::Screen { query } => {
            let search = SearchService::new(client.clone());
            search.search(&query).await;
            let state = search.snapshot();
            if let Some(error) = state.error {
                bail!("Search for {:?} failed: {}", query, error);
            }

            let envelope = client.batch_valuation(&state.results).await?;
            let mut rows = match envelope.into_data() {
                Some(rows) => rows,
                None => bail!("Batch valuation returned no data"),
            };
            sort_batch(&mut rows);
            println!("{}", renderer.batch(&rows));
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries rendered output, so logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn select_company(backend: Arc<dyn AnalysisBackend>, query: &str, pick: usize) -> Result<Company> {
    let search = SearchService::new(backend);
    search.search(query).await;
    let state = search.snapshot();

    if let Some(error) = state.error {
        bail!("Search for {:?} failed: {}", query, error);
    }
    let count = state.results.len();
    state
        .results
        .into_iter()
        .nth(pick)
        .with_context(|| format!("--pick {} is out of range ({} companies matched {:?})", pick, count, query))
}

/// Print each frame as soon as it settles, in completion order
async fn analyze(backend: Arc<dyn AnalysisBackend>, company: Company, renderer: &dyn Renderer) -> Result<()> {
    let orchestrator = AnalysisOrchestrator::new(backend);
    let mut updates = orchestrator.subscribe();

    println!("{}", renderer.header(&company));
    let run = orchestrator.run_analysis(company);

    let mut printed: Vec<Stage> = Vec::with_capacity(Stage::ALL.len());
    loop {
        let state = updates.borrow_and_update().clone();
        for stage in Stage::ALL {
            if state.is_settled(stage) && !printed.contains(&stage) {
                println!("{}", renderer.stage(&state, stage));
                printed.push(stage);
            }
        }
        if state.is_complete() {
            break;
        }
        if updates.changed().await.is_err() {
            break;
        }
    }

    run.await.context("Analysis task panicked")?;

    let failed = Stage::ALL
        .iter()
        .filter(|stage| orchestrator.snapshot().error(**stage).is_some())
        .count();
    if failed > 0 {
        tracing::warn!("{} of {} frames failed", failed, Stage::ALL.len());
    }
    Ok(())
}
