use skov_lib::config::SkovConfig;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            SkovConfig::load(Path::new(&path))?
        }
        None if Path::new("skov.toml").exists() => {
            info!("Loading configuration from skov.toml");
            SkovConfig::load(Path::new("skov.toml"))?
        }
        None => {
            info!("Using default configuration");
            SkovConfig::default()
        }
    };

    skov_lib::run(config).await
}
