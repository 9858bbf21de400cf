use std::sync::Arc;

use acton_viewsets::prelude::*;
use articles_service::{app, models::Article, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    init_tracing(&config)?;

    info!("Starting articles service");

    let store = Arc::new(MemoryStore::<Article>::new());
    let state = AppState::new(config.clone(), store);

    // Run server
    Server::new(config).serve(app(state)).await?;

    shutdown_tracing();
    Ok(())
}
