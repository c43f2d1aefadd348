use crate::broker::Broker;
use crate::config::SessionConfig;
use crate::graph::{RoomGraph, RoomId};
use crate::protocol::RoomSnapshot;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Everything one automation session owns: the room graph, the last reported
/// location and the tracking toggle.
///
/// Only snapshot intake writes the graph; exploration, planning and patrol read it.
pub struct SessionContext {
    start_room: RoomId,
    excluded: HashSet<RoomId>,
    enabled: AtomicBool,
    graph: RwLock<RoomGraph>,
    current_room: watch::Sender<Option<RoomId>>,
}

impl SessionContext {
    pub fn new(config: &SessionConfig) -> Self {
        let excluded: HashSet<RoomId> = config.excluded_rooms.iter().copied().collect();
        let (current_room, _) = watch::channel(None);
        Self {
            start_room: config.start_room,
            graph: RwLock::new(RoomGraph::new(excluded.iter().copied())),
            excluded,
            enabled: AtomicBool::new(config.enabled),
            current_room,
        }
    }

    pub fn start_room(&self) -> RoomId {
        self.start_room
    }

    pub fn is_excluded(&self, room_id: RoomId) -> bool {
        self.excluded.contains(&room_id)
    }

    pub fn excluded(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.excluded.iter().copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn current_room(&self) -> Option<RoomId> {
        *self.current_room.borrow()
    }

    /// Receiver that observes every location change.
    pub fn watch_room(&self) -> watch::Receiver<Option<RoomId>> {
        self.current_room.subscribe()
    }

    pub async fn graph(&self) -> RwLockReadGuard<'_, RoomGraph> {
        self.graph.read().await
    }

    pub async fn replace_graph(&self, graph: RoomGraph) {
        *self.graph.write().await = graph;
    }

    /// Apply one inbound broker message. Messages without a room are ignored.
    ///
    /// The location is published after the graph is updated, so anyone
    /// waiting on arrival sees the room's exits.
    pub async fn apply_message(&self, message: &Value) -> Option<RoomId> {
        let snapshot = RoomSnapshot::from_message(message)?;

        if self.is_enabled() {
            let fields = snapshot.fields.as_deref().unwrap_or_default();
            let tracked = self
                .graph
                .write()
                .await
                .track(snapshot.id, snapshot.name.as_deref(), fields);
            debug!(room = snapshot.id, tracked, "Applied room snapshot");
        }

        self.current_room.send_replace(Some(snapshot.id));
        Some(snapshot.id)
    }

    /// Feed the broker's inbound snapshots into this session until the broker goes away.
    pub fn listen(self: &Arc<Self>, broker: &dyn Broker) -> JoinHandle<()> {
        let mut inbound = broker.subscribe();
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match inbound.recv().await {
                    Ok(message) => {
                        ctx.apply_message(&message).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Snapshot listener lagged, {} messages skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
