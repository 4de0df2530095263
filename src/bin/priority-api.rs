/// Priority API - HTTP endpoint that assigns folder priorities to record batches
///
/// Configuration is read from the environment (and an optional `.env` file) on
/// every request, so rule changes apply without a restart.

use std::net::SocketAddr;
use std::sync::Arc;

use folder_priority::api::{router, AppState, ConfigSource};
use folder_priority::config::RULES_VAR;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    if std::env::var(RULES_VAR).is_err() {
        tracing::warn!("{} is not set; every record will get the default priority", RULES_VAR);
    }

    let state = Arc::new(AppState::new(ConfigSource::Environment));
    let app = router(state);

    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => match raw.parse() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("Invalid PORT: {}", raw);
                std::process::exit(1);
            }
        },
        Err(_) => 8080,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Priority API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
