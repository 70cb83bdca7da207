use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server::config::{ServerConfig, DEFAULT_CONFIG_FILE};
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "resize")]
#[command(about = "Stop, reconfigure and restart cloud instances", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP and WebSocket server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { force }) => init_config(&cli.config, force).await,
        Some(Commands::Serve { port }) => serve(&cli.config, port).await,
        None => serve(&cli.config, None).await,
    }
}

async fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    ServerConfig::default()
        .write(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust [workflow] polling and [simulated] instances as needed");
    println!("  2. Run 'resize serve' to start the server");

    Ok(())
}

async fn serve(config_path: &Path, port: Option<u16>) -> Result<()> {
    init_tracing();

    let mut config = ServerConfig::read(config_path)
        .await
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(port) = port {
        config.port = port;
    }

    let state = AppState::from_config(&config);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        address = %listener.local_addr()?,
        verify_origin_state = config.workflow.verify_origin_state,
        "Server listening"
    );
    println!();
    println!("  API Server:  http://{}", address);
    println!("  OpenAPI:     http://{}/api/openapi.json", address);
    println!("  Resize:      ws://{}/api/instances/{{id}}/resize?state=running", address);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "resize=info,server=info,orchestrator=info,websocket=info,tower_http=info".into()
            }),
        )
        .init();
}
