// src/main.rs
// Binary entry point. Loads configuration and runs the WebSocket server.

use tokio::net::TcpListener;
use tracing::info;

use curve_server::config::{load_env, log_filter};
use curve_server::{serve, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so RUST_LOG can come from it
    let env_file = load_env();

    // --- Logging --- //
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();
    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }

    // --- Configuration --- //
    let config = Config::from_env()?;
    info!(
        initial_price = config.curve.initial_price,
        growth_rate = config.curve.growth_rate,
        auth = config.jwt_secret.is_some(),
        "Configuration loaded"
    );

    // --- Initialization --- //
    let addr = config.listen_addr.clone();
    let app_state = AppState::new(config)?;

    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on: {}", addr);

    // --- Server Loop --- //
    serve(listener, app_state).await;
    Ok(())
}
