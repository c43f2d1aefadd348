//! Breadth-first discovery of the maze by walking it.
//!
//! The explorer issues a goto for each frontier room, waits for the broker's
//! snapshot of that room to be applied, and enqueues the exits the snapshot
//! revealed. Connectivity is not checked: a goto sent while disconnected is
//! dropped by the broker, the arrival wait times out, and the room is treated
//! as having no known exits.

use super::arrival::wait_for_arrival;
use super::cancel::CancelToken;
use crate::broker::Broker;
use crate::graph::RoomId;
use crate::protocol::Command;
use crate::state::SessionContext;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationState {
    NotStarted,
    InProgress,
    /// Only reached when the frontier empties; cancellation leaves `InProgress`.
    Complete,
}

pub struct Explorer {
    ctx: Arc<SessionContext>,
    broker: Arc<dyn Broker>,
    settle_timeout: Duration,
    frontier: VecDeque<RoomId>,
    visited: HashSet<RoomId>,
    state: ExplorationState,
}

impl Explorer {
    pub fn new(ctx: Arc<SessionContext>, broker: Arc<dyn Broker>, settle_timeout: Duration) -> Self {
        Self {
            ctx,
            broker,
            settle_timeout,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            state: ExplorationState::NotStarted,
        }
    }

    pub fn state(&self) -> ExplorationState {
        self.state
    }

    pub fn visited(&self) -> &HashSet<RoomId> {
        &self.visited
    }

    pub async fn run(&mut self, token: &CancelToken) -> ExplorationState {
        let run_id = Uuid::new_v4();
        let start = self.ctx.start_room();

        self.frontier = VecDeque::from([start]);
        self.visited.clear();
        self.state = ExplorationState::InProgress;
        info!(%run_id, "Exploration started from room {}", start);

        while let Some(room_id) = self.frontier.pop_front() {
            if token.is_cancelled() {
                info!(%run_id, visited = self.visited.len(), "Exploration cancelled");
                return self.state;
            }
            if self.visited.contains(&room_id) || self.ctx.is_excluded(room_id) {
                continue;
            }
            self.visited.insert(room_id);

            if self.ctx.current_room() != Some(room_id) {
                if !self.broker.send(&Command::goto(room_id)).await {
                    debug!(%run_id, "goto {} was not delivered", room_id);
                }
                if !wait_for_arrival(&self.ctx, room_id, self.settle_timeout).await {
                    warn!(
                        %run_id,
                        "No snapshot for room {} within {:?}, continuing with known exits",
                        room_id, self.settle_timeout
                    );
                }
                if token.is_cancelled() {
                    info!(%run_id, visited = self.visited.len(), "Exploration cancelled");
                    return self.state;
                }
            }

            let graph = self.ctx.graph().await;
            for target in graph.neighbors(room_id) {
                if !self.visited.contains(&target) && !self.ctx.is_excluded(target) {
                    self.frontier.push_back(target);
                }
            }
        }

        self.state = ExplorationState::Complete;
        info!(%run_id, visited = self.visited.len(), "Exploration complete");
        self.state
    }
}
