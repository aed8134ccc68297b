// CAS Lookup - Web Server
// REST API with Axum over the in-memory reference tables

use anyhow::{Context, Result};
use cas_lookup::api::{build_router, AppState};
use cas_lookup::config::load_dotenv;
use cas_lookup::logging::{init_logger, level_for};
use cas_lookup::{Config, DataStore};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cas-server")]
#[command(version)]
#[command(about = "HTTP lookup service for the PMNACC and TSCA inventory tables", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_logger(level_for(cli.verbose));

    info!("CAS Lookup web server v{}", cas_lookup::VERSION);

    // Remote fetch is blocking: load off the async workers
    let config = cli.config.clone();
    let store = tokio::task::spawn_blocking(move || DataStore::load(&config))
        .await
        .context("Loading reference tables panicked")?;

    if store.is_fully_loaded() {
        info!("Data loaded successfully: {} records", store.total_records());
    } else {
        warn!("Failed to load some data files; serving in degraded mode");
    }

    let app = build_router(AppState::new(store, cli.config));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("API: http://{}/api/search", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
