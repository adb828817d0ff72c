use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use statswatch::config::{Overrides, RegistrySource, Settings};
use statswatch::duration::format_duration;
use statswatch::query;

#[derive(Parser, Debug)]
#[command(name = "statswatch")]
#[command(about = "Scrapes runtime stats from discovered service nodes and serves them over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the collector and stats server (default)
    Serve(ServeArgs),

    /// Read stats from a running server
    Query(QueryArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file listing services and nodes
    #[arg(long, conflicts_with = "registry_url")]
    registry_file: Option<PathBuf>,

    /// Registry HTTP API endpoint
    #[arg(long)]
    registry_url: Option<String>,

    /// Address for the stats server (e.g., "127.0.0.1:8089")
    #[arg(short, long)]
    listen: Option<String>,

    /// Time between scrapes (e.g., "1s", "500ms")
    #[arg(long)]
    scrape_interval: Option<String>,

    /// Time between registry refreshes (e.g., "10s")
    #[arg(long)]
    refresh_interval: Option<String>,

    /// Per-node call deadline (e.g., "2s")
    #[arg(long)]
    call_timeout: Option<String>,

    /// Number of scrape ticks kept in history
    #[arg(long)]
    window: Option<u32>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Address of a running stats server (host:port or URL)
    #[arg(short, long, default_value = statswatch::config::DEFAULT_LISTEN)]
    addr: String,

    /// Only return stats for this service
    #[arg(short, long)]
    service: Option<String>,

    /// Only return stats for this version (requires --service)
    #[arg(short, long, requires = "service")]
    version: Option<String>,

    /// Return the retained history instead of the latest scrape
    #[arg(short, long)]
    past: bool,

    /// Request timeout (e.g., "5s")
    #[arg(long, default_value = "5s")]
    timeout: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Query(args)) => run_query(args).await,
        Some(Command::Serve(args)) => run_serve(args).await,
        None => run_serve(cli.serve).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let overrides = Overrides {
        scrape_interval: args.scrape_interval,
        refresh_interval: args.refresh_interval,
        call_timeout: args.call_timeout,
        window: args.window,
        listen: args.listen,
        registry_file: args.registry_file,
        registry_url: args.registry_url,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let registry = match &settings.registry {
        RegistrySource::File(path) => path.display().to_string(),
        RegistrySource::Http(url) => url.clone(),
    };
    info!(
        %registry,
        listen = %settings.listen,
        scrape_interval = %format_duration(settings.collector.scrape_interval),
        refresh_interval = %format_duration(settings.collector.refresh_interval),
        call_timeout = %format_duration(settings.collector.call_timeout),
        window = settings.collector.window,
        "starting statswatch"
    );

    statswatch::run(settings, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    })
    .await
}

async fn run_query(args: QueryArgs) -> Result<()> {
    let timeout = query::request_timeout(&args.timeout)?;
    let request = query::build_request(args.service.as_deref(), args.version.as_deref(), args.past);

    let response = query::query(&args.addr, &request, timeout).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
