//! Continuous patrol along a route.
//!
//! Each leg is resolved to concrete hops with a fresh BFS from wherever the
//! session currently is, so a missed hop is corrected on the next leg rather
//! than replayed.

use super::arrival::wait_for_arrival;
use super::cancel::CancelToken;
use crate::broker::Broker;
use crate::graph::{shortest_path, RoomId};
use crate::planning::Route;
use crate::protocol::Command;
use crate::state::SessionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathExecutionState {
    Idle,
    Running,
    Stopped,
}

pub struct PathExecutor {
    ctx: Arc<SessionContext>,
    broker: Arc<dyn Broker>,
    hop_interval: Duration,
    state: PathExecutionState,
    passes: u64,
}

impl PathExecutor {
    pub fn new(ctx: Arc<SessionContext>, broker: Arc<dyn Broker>, hop_interval: Duration) -> Self {
        Self {
            ctx,
            broker,
            hop_interval,
            state: PathExecutionState::Idle,
            passes: 0,
        }
    }

    pub fn state(&self) -> PathExecutionState {
        self.state
    }

    /// Completed passes over the route.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Patrol `route` until `token` is cancelled. An empty route returns at once.
    pub async fn run(&mut self, route: &Route, token: &CancelToken) -> PathExecutionState {
        if route.is_empty() {
            info!("No route to patrol");
            return self.state;
        }

        let run_id = Uuid::new_v4();
        self.state = PathExecutionState::Running;
        info!(%run_id, rooms = route.len(), "Patrol started");

        'patrol: while !token.is_cancelled() {
            let mut hops = 0usize;

            for target in route.iter() {
                if token.is_cancelled() {
                    break 'patrol;
                }

                let Some(from) = self.ctx.current_room() else {
                    warn!(%run_id, "Current room unknown, skipping room {}", target);
                    continue;
                };
                let path = {
                    let graph = self.ctx.graph().await;
                    shortest_path(&graph, from, target)
                };
                let Some(path) = path else {
                    info!(%run_id, "No known path from {} to {}, skipping", from, target);
                    continue;
                };

                for &hop in &path[1..] {
                    if token.is_cancelled() {
                        break 'patrol;
                    }
                    self.hop(run_id, hop).await;
                    hops += 1;
                }
            }

            self.passes += 1;
            debug!(%run_id, pass = self.passes, hops, "Patrol pass finished");

            // A pass that went nowhere would otherwise spin without yielding
            if hops == 0 && !token.sleep(self.hop_interval).await {
                break;
            }
        }

        self.state = PathExecutionState::Stopped;
        info!(%run_id, passes = self.passes, "Patrol stopped");
        self.state
    }

    /// One goto, then hold until the hop interval has passed.
    async fn hop(&self, run_id: Uuid, room: RoomId) {
        let sent_at = Instant::now();
        if !self.broker.send(&Command::goto(room)).await {
            debug!(%run_id, "goto {} was not delivered", room);
        }
        if !wait_for_arrival(&self.ctx, room, self.hop_interval).await {
            warn!(%run_id, "Did not reach room {} within {:?}", room, self.hop_interval);
        }
        tokio::time::sleep_until(sent_at + self.hop_interval).await;
    }
}
