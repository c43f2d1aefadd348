use crate::automation::Controller;
use std::str::FromStr;

/// Text commands accepted by the host on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Explore,
    Collect,
    Stop,
    Status,
    Graph,
    Route,
    Enable,
    Disable,
    Quit,
}

impl FromStr for HostCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explore" => Ok(HostCommand::Explore),
            "collect" | "patrol" => Ok(HostCommand::Collect),
            "stop" => Ok(HostCommand::Stop),
            "status" => Ok(HostCommand::Status),
            "graph" => Ok(HostCommand::Graph),
            "route" | "path" => Ok(HostCommand::Route),
            "enable" => Ok(HostCommand::Enable),
            "disable" => Ok(HostCommand::Disable),
            "quit" | "exit" => Ok(HostCommand::Quit),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

/// Run one host command and render its reply.
pub async fn dispatch(controller: &Controller, command: HostCommand) -> Result<String, String> {
    match command {
        HostCommand::Explore => {
            controller
                .start_exploration()
                .await
                .map_err(|e| e.to_string())?;
            Ok("Exploration started".to_string())
        }
        HostCommand::Collect => {
            controller
                .start_collecting()
                .await
                .map_err(|e| e.to_string())?;
            Ok("Patrol started".to_string())
        }
        HostCommand::Stop => {
            if controller.stop().await {
                Ok("Stopping".to_string())
            } else {
                Ok("Nothing running".to_string())
            }
        }
        HostCommand::Status => {
            serde_json::to_string_pretty(&controller.status().await).map_err(|e| e.to_string())
        }
        HostCommand::Graph => {
            serde_json::to_string_pretty(&controller.graph().await).map_err(|e| e.to_string())
        }
        HostCommand::Route => {
            serde_json::to_string(&controller.route().await).map_err(|e| e.to_string())
        }
        HostCommand::Enable => {
            controller.set_enabled(true);
            Ok("Enabled".to_string())
        }
        HostCommand::Disable => {
            controller.set_enabled(false);
            Ok("Disabled".to_string())
        }
        HostCommand::Quit => {
            controller.stop().await;
            Ok("Bye".to_string())
        }
    }
}
