use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use petcare_api::config::AppConfig;
use petcare_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "petcare-api", version, about = "PetCare data-access and dispatch service")]
struct Args {
    /// Port to listen on (overrides PORT and the environment profile)
    #[arg(long)]
    port: Option<u16>,

    /// Validate configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and provider keys
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = petcare_api::config::config().clone();

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting PetCare API in {:?} mode", config.environment);

    config.validate().context("invalid configuration")?;
    if args.check_config {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    serve(config, args.port).await
}

async fn serve(config: AppConfig, port_override: Option<u16>) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(config.api.port);
    let state = AppState::from_config(config)?;
    let database = state.database.clone();
    let app = petcare_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("PetCare API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
