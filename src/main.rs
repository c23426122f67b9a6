//! llm-proxy HTTP server

use clap::Parser;
use llm_proxy::cli::{Cli, Command, generate_config_template};
use llm_proxy::{config::Config, credentials::CredentialStore, handlers, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;
    telemetry::init(&config.observability.log_level);

    let credentials = CredentialStore::from_env(&config);
    tracing::info!(
        configured = ?credentials.configured(),
        "Resolved provider credentials"
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| format!("Invalid server.host '{}': {}", config.server.host, e))?,
        config.server.port,
    ));

    let state = handlers::AppState::new(Arc::new(config), credentials)?;
    let app = handlers::router(state);

    tracing::info!("Starting llm-proxy on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
