//! Configuration loading for skov

use crate::graph::RoomId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SESSION_FILE: &str = "skov-session.json";

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SkovConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl SkovConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Maze and automation settings
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// Room exploration starts from and every route begins with (default: 300)
    #[serde(default = "default_start_room")]
    pub start_room: RoomId,

    /// Rooms never tracked, entered or routed through (default: [350, 351])
    #[serde(default = "default_excluded_rooms")]
    pub excluded_rooms: Vec<RoomId>,

    /// Whether snapshots are tracked and the start actions accepted (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Explore and then patrol as soon as the host is connected (default: false)
    #[serde(default)]
    pub auto_start: bool,
}

/// Settle and pacing intervals
#[derive(Clone, Debug, Deserialize)]
pub struct TimingConfig {
    /// Longest the explorer waits for a room snapshot after a goto (default: 1500)
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_ms: u64,

    /// Time per patrol hop, also the bound on waiting for arrival (default: 1000)
    #[serde(default = "default_hop_interval")]
    pub hop_interval_ms: u64,
}

impl TimingConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn hop_interval(&self) -> Duration {
        Duration::from_millis(self.hop_interval_ms)
    }
}

/// Broker bridge address
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// host:port of the newline-delimited JSON bridge (default: 127.0.0.1:7878)
    #[serde(default = "default_address")]
    pub address: String,
}

/// Where the route (and optionally the graph) is saved
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Session file path (default: <data dir>/skov/skov-session.json)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Also write the room graph next to the route (default: false)
    #[serde(default)]
    pub persist_graph: bool,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("skov").join(SESSION_FILE)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_room: default_start_room(),
            excluded_rooms: default_excluded_rooms(),
            enabled: default_enabled(),
            auto_start: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: default_settle_timeout(),
            hop_interval_ms: default_hop_interval(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

// Kontamineret skov - Indgang
fn default_start_room() -> RoomId {
    300
}

// Dr. Grøns Laboratorie, Bunkeren
fn default_excluded_rooms() -> Vec<RoomId> {
    vec![350, 351]
}

fn default_enabled() -> bool {
    true
}

fn default_settle_timeout() -> u64 {
    1500
}

fn default_hop_interval() -> u64 {
    1000
}

fn default_address() -> String {
    "127.0.0.1:7878".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
