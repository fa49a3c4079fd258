//! `jarvis serve`: start the HTTP API server.

use std::path::Path;

use super::{load_config, warn_if_no_api_key};

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    warn_if_no_api_key(&config);

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Jarvis Gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Chat:      POST /api/chat");
    println!(
        "   Voice:     {}",
        if config.voice.enabled { "POST /api/speak" } else { "disabled" }
    );

    jarvis_gateway::start(config).await?;

    Ok(())
}
