use crate::graph::{Room, RoomId};
use crate::planning::Route;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const SESSION_VERSION: u32 = 1;

/// What survives between runs: the patrol route and, when enabled, the graph
/// it was planned on. Without the graph a saved route cannot be patrolled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub version: u32,
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<BTreeMap<RoomId, Room>>,
    /// First-visit order of the graph's rooms; route ties are broken by it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered: Vec<RoomId>,
    #[serde(default)]
    pub saved_at: u64,
}

impl SavedSession {
    pub fn new(route: Route) -> Self {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            version: SESSION_VERSION,
            route,
            graph: None,
            discovered: Vec::new(),
            saved_at,
        }
    }

    pub fn with_graph(mut self, rooms: BTreeMap<RoomId, Room>, discovered: Vec<RoomId>) -> Self {
        self.graph = Some(rooms);
        self.discovered = discovered;
        self
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved session, if the file exists and is readable.
    pub fn load(&self) -> Option<SavedSession> {
        let content = fs::read_to_string(&self.path).ok()?;
        let saved: SavedSession = match serde_json::from_str(&content) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                return None;
            }
        };

        if saved.version != SESSION_VERSION {
            warn!("Session file version mismatch, ignoring");
            return None;
        }

        Some(saved)
    }

    pub fn save(&self, session: &SavedSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
