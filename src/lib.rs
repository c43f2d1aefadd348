pub mod automation;
pub mod broker;
mod commands;
pub mod config;
pub mod graph;
pub mod planning;
pub mod protocol;
pub mod state;

use automation::Controller;
use broker::{Broker, StreamBroker};
use commands::{dispatch, HostCommand};
use config::SkovConfig;
use state::{SessionContext, SessionStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Connect to the broker bridge and drive the controller from stdin until
/// `quit`, end of input, or the bridge closing.
pub async fn run(config: SkovConfig) -> anyhow::Result<()> {
    info!("Connecting to {}", config.connection.address);
    let (broker, pump) = StreamBroker::connect(config.connection.address.as_str()).await?;
    let broker: Arc<dyn Broker> = broker;

    // Subscribe before reading so the bridge's first snapshot is not lost
    let ctx = Arc::new(SessionContext::new(&config.session));
    let _listener = ctx.listen(broker.as_ref());
    let mut pump = pump.spawn();

    let store = SessionStore::new(config.storage.resolved_path());
    let saved = store.load();
    let controller = Controller::new(ctx, broker, config.timing.clone())
        .with_store(store, &config.storage);

    if let Some(saved) = saved {
        controller.restore(saved).await;
    }

    if config.session.auto_start {
        let status = controller.status().await;
        let started = if status.exploration == automation::ExplorationState::Complete {
            controller.start_collecting().await
        } else {
            controller.start_auto().await
        };
        if let Err(e) = started {
            warn!("Auto start failed: {}", e);
        }
    }

    info!("Ready. Commands: explore, collect, stop, status, graph, route, enable, disable, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<HostCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match dispatch(&controller, command).await {
                    Ok(reply) => println!("{}", reply),
                    Err(e) => println!("Error: {}", e),
                }
                if command == HostCommand::Quit {
                    break;
                }
            }
            _ = &mut pump => {
                warn!("Broker connection closed");
                controller.stop().await;
                break;
            }
        }
    }

    Ok(())
}
