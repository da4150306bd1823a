use clap::{ArgGroup, Parser};
use futures::future::join_all;
use sheet_core::{FetchGateway, ListingProvider, Result, SheetId};
use sheet_loader::config::LoaderConfig;
use sheet_loader::gateway::{DiskGateway, HttpGateway};
use sheet_loader::sheet::{LoaderSnapshot, SheetLoader};
use sheet_workbook::WorkbookMaterializer;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Loads every sheet of a dashboard and prints its sections as JSON.
#[derive(Parser, Debug)]
#[command(name = "sheet-loader", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["dir", "url"])))]
struct Cli {
    /// Dashboard directory (listing.json, <id>.json, <id>.revisions.json)
    dir: Option<PathBuf>,

    /// Base URL of a dashboard HTTP API, instead of a directory
    #[arg(long)]
    url: Option<String>,

    /// Snapshot file: restored from if present, written back on exit
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

type Gateways = (Arc<dyn FetchGateway>, Arc<dyn ListingProvider>);

fn build_gateways(cli: &Cli, config: &LoaderConfig) -> Result<Gateways> {
    if let Some(url) = &cli.url {
        let http = Arc::new(HttpGateway::new(url.as_str(), &config.http)?);
        let gateway: Arc<dyn FetchGateway> = http.clone();
        let listing: Arc<dyn ListingProvider> = http;
        return Ok((gateway, listing));
    }
    let dir = cli.dir.clone().unwrap_or_default();
    let disk = Arc::new(DiskGateway::with_limits(dir, config.fetch.clone()));
    let gateway: Arc<dyn FetchGateway> = disk.clone();
    let listing: Arc<dyn ListingProvider> = disk;
    Ok((gateway, listing))
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };

    let (gateway, listing) = build_gateways(&cli, &config)?;
    let loader = SheetLoader::with_config(gateway, Arc::new(WorkbookMaterializer::new()), config);

    match cli.snapshot.as_deref().filter(|path| path.exists()) {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            let snapshot: LoaderSnapshot = serde_json::from_str(&content)?;
            loader.restore(snapshot);
        }
        None => {
            loader.load_listing(listing.as_ref()).await?;
        }
    }

    let ids: Vec<SheetId> = loader.snapshot().sheets.iter().map(|s| s.id).collect();
    for result in join_all(ids.iter().map(|id| loader.load_and_wait(*id))).await {
        let sheet = result?;
        if let Some(error) = sheet.error() {
            tracing::warn!("sheet {} ({}) failed: {}", sheet.id, sheet.display_name, error);
        }
    }

    println!("{}", serde_json::to_string_pretty(&loader.list_sections())?);

    if let Some(path) = &cli.snapshot {
        tokio::fs::write(path, serde_json::to_vec_pretty(&loader.snapshot())?).await?;
        tracing::info!("wrote snapshot to {}", path.display());
    }

    Ok(())
}
