//! Simulated maze that answers goto commands with room snapshots.

#![allow(dead_code)]

use skov_lib::broker::{Broker, ChannelBroker};
use skov_lib::config::SessionConfig;
use skov_lib::graph::{Direction, RoomId};
use skov_lib::protocol::{Command, Field, RoomSnapshot};
use skov_lib::state::SessionContext;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
pub struct Maze {
    rooms: HashMap<RoomId, (String, Vec<(Direction, RoomId)>)>,
    /// Rooms whose snapshots never arrive.
    silent: HashSet<RoomId>,
}

impl Maze {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(mut self, id: RoomId, name: &str, doors: &[(Direction, RoomId)]) -> Self {
        self.rooms.insert(id, (name.to_string(), doors.to_vec()));
        self
    }

    pub fn silent(mut self, id: RoomId) -> Self {
        self.silent.insert(id);
        self
    }

    /// 300 -E-> 301, 301 -W-> 300, 301 -S-> 302, 302 -N-> 301, plus a lab door 301 -E-> 350.
    pub fn forest() -> Self {
        Self::new()
            .room(300, "Indgang", &[(Direction::East, 301)])
            .room(
                301,
                "Skov",
                &[
                    (Direction::West, 300),
                    (Direction::South, 302),
                    (Direction::East, 350),
                ],
            )
            .room(302, "Lysning", &[(Direction::North, 301)])
            .room(350, "Laboratorie", &[(Direction::West, 301)])
    }

    /// 3x3 grid numbered 300..=308 row by row, every neighbour connected both ways.
    pub fn grid() -> Self {
        let mut maze = Self::new();
        for row in 0..3u32 {
            for col in 0..3u32 {
                let id = 300 + row * 3 + col;
                let mut doors = Vec::new();
                if row > 0 {
                    doors.push((Direction::North, id - 3));
                }
                if col < 2 {
                    doors.push((Direction::East, id + 1));
                }
                if row < 2 {
                    doors.push((Direction::South, id + 3));
                }
                if col > 0 {
                    doors.push((Direction::West, id - 1));
                }
                maze = maze.room(id, &format!("Felt {}", id), &doors);
            }
        }
        maze
    }

    pub fn snapshot(&self, id: RoomId) -> Option<RoomSnapshot> {
        let (name, doors) = self.rooms.get(&id)?;
        let mut fields = vec![Field::new(0.0, 0.0), Field::new(10.0, 10.0)];
        for (direction, target) in doors {
            let (x, y) = match direction {
                Direction::North => (5.0, 0.0),
                Direction::East => (10.0, 5.0),
                Direction::South => (5.0, 10.0),
                Direction::West => (0.0, 5.0),
            };
            fields.push(Field::door(x, y, *target));
        }
        Some(RoomSnapshot {
            id,
            name: Some(name.clone()),
            fields: Some(fields),
        })
    }
}

/// Answer every goto for a known room with its snapshot after `latency`.
pub fn spawn_maze(broker: Arc<ChannelBroker>, maze: Maze, latency: Duration) -> JoinHandle<()> {
    let mut commands = broker.subscribe_outbound();
    tokio::spawn(async move {
        while let Ok(command) = commands.recv().await {
            let room = command.target_room();
            if maze.silent.contains(&room) {
                continue;
            }
            if let Some(snapshot) = maze.snapshot(room) {
                tokio::time::sleep(latency).await;
                broker.deliver(snapshot.to_message());
            }
        }
    })
}

/// Session with default config, listening to `broker`, standing in `start`.
pub async fn session_in(broker: &Arc<ChannelBroker>, maze: &Maze, start: RoomId) -> Arc<SessionContext> {
    let ctx = Arc::new(SessionContext::new(&SessionConfig::default()));
    ctx.listen(broker.as_ref());
    if let Some(snapshot) = maze.snapshot(start) {
        broker.deliver(snapshot.to_message());
        ctx.watch_room()
            .wait_for(|room| *room == Some(start))
            .await
            .expect("session dropped");
    }
    ctx
}

/// Everything sent so far, without waiting.
pub fn drain_gotos(rx: &mut tokio::sync::broadcast::Receiver<Command>) -> Vec<RoomId> {
    let mut rooms = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(command) => rooms.push(command.target_room()),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    rooms
}
