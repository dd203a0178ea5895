use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use sentiment_server::{api, init_logger, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let config = ServerConfig::parse();

    info!("=== Starting sentiment server ===");

    // Without a model there is nothing to serve, so load failures end the process
    let state = match AppState::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to load model: {:#}", e);
            return Err(e);
        }
    };

    api::serve(&config, Arc::new(state)).await?;
    Ok(())
}
