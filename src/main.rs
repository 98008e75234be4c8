use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dirshare::{AppState, Config, ServerRoot, routes};

#[derive(Parser, Debug)]
#[command(name = "dirshare")]
#[command(about = "Share a directory over HTTP for browsing, download and upload")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DIRSHARE_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to (all interfaces by default)
    #[arg(short, long, env = "DIRSHARE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Initial directory to serve
    #[arg(short, long, env = "DIRSHARE_DIRECTORY", default_value = ".")]
    directory: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "DIRSHARE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "DIRSHARE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "dirshare=debug,tower_http=debug"
    } else {
        "dirshare=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    let root = ServerRoot::open(&cli.directory).map_err(|_| {
        format!(
            "Directory does not exist or is not a directory: {}",
            cli.directory.display()
        )
    })?;

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving directory {} on http://{}", root, addr);

    let app = routes::app(AppState::with_config(root, config));
    axum::serve(listener, app).await?;

    Ok(())
}
