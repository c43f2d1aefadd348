//! Room graph built incrementally from inbound room snapshots.
//!
//! Exits are derived geometrically: each door field is classified by its
//! offset from the bounding-box centroid of all fields in the room.
//! Re-tracking a room replaces its entry, so a later visit with incomplete
//! field data can shrink the exits known from an earlier visit.

use crate::protocol::Field;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub type RoomId = u32;

/// Cardinal exit direction, serialized as the arrow key that walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ArrowUp")]
    North,
    #[serde(rename = "ArrowRight")]
    East,
    #[serde(rename = "ArrowDown")]
    South,
    #[serde(rename = "ArrowLeft")]
    West,
}

impl Direction {
    /// Classify a door offset from the room centroid (screen coordinates, y grows down).
    ///
    /// Horizontal wins only when strictly dominant; `|dx| == |dy|` resolves vertically.
    pub fn from_offset(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx < 0.0 {
                Direction::West
            } else {
                Direction::East
            }
        } else if dy < 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub exits: BTreeMap<Direction, RoomId>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
    /// Every tracked room in first-visit order, including rooms without doors.
    discovered: Vec<RoomId>,
    discovered_set: HashSet<RoomId>,
    excluded: HashSet<RoomId>,
}

impl RoomGraph {
    pub fn new(excluded: impl IntoIterator<Item = RoomId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Rebuild a graph from a persisted room mapping.
    ///
    /// `discovered` restores the first-visit order; rooms it does not list
    /// follow in id order.
    pub fn from_rooms(
        mut rooms: BTreeMap<RoomId, Room>,
        discovered: &[RoomId],
        excluded: impl IntoIterator<Item = RoomId>,
    ) -> Self {
        let mut graph = Self::new(excluded);
        rooms.retain(|id, _| !graph.is_excluded(*id));
        for room in rooms.values_mut() {
            room.exits.retain(|_, target| !graph.excluded.contains(target));
        }

        for &id in discovered {
            if rooms.contains_key(&id) {
                graph.mark_discovered(id);
            }
        }
        for &id in rooms.keys() {
            graph.mark_discovered(id);
        }
        graph.rooms = rooms;
        graph
    }

    /// Record a visit to `room_id`. Returns false when the room is excluded.
    pub fn track(&mut self, room_id: RoomId, name: Option<&str>, fields: &[Field]) -> bool {
        if self.is_excluded(room_id) {
            return false;
        }

        self.mark_discovered(room_id);

        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .rooms
                .get(&room_id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
        };

        let doors: Vec<(&Field, RoomId)> = fields
            .iter()
            .filter_map(|f| f.door_target().map(|target| (f, target)))
            .collect();

        if doors.is_empty() {
            self.rooms.insert(
                room_id,
                Room {
                    name,
                    exits: BTreeMap::new(),
                },
            );
            return true;
        }

        let (center_x, center_y) = centroid(fields);

        let mut exits = BTreeMap::new();
        for (door, target) in doors {
            let direction = Direction::from_offset(door.x - center_x, door.y - center_y);
            if !self.excluded.contains(&target) {
                exits.insert(direction, target);
            }
        }

        self.rooms.insert(room_id, Room { name, exits });
        true
    }

    pub fn is_excluded(&self, room_id: RoomId) -> bool {
        self.excluded.contains(&room_id)
    }

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn rooms(&self) -> &BTreeMap<RoomId, Room> {
        &self.rooms
    }

    pub fn discovered(&self) -> &[RoomId] {
        &self.discovered
    }

    pub fn is_discovered(&self, room_id: RoomId) -> bool {
        self.discovered_set.contains(&room_id)
    }

    /// Exit targets of a room, in direction order. Unknown rooms have none.
    pub fn neighbors(&self, room_id: RoomId) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms
            .get(&room_id)
            .into_iter()
            .flat_map(|room| room.exits.values().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    fn mark_discovered(&mut self, room_id: RoomId) {
        if self.discovered_set.insert(room_id) {
            self.discovered.push(room_id);
        }
    }
}

/// Bounding-box centre of all fields, doors included.
fn centroid(fields: &[Field]) -> (f64, f64) {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for field in fields {
        min_x = min_x.min(field.x);
        max_x = max_x.max(field.x);
        min_y = min_y.min(field.y);
        max_y = max_y.max(field.y);
    }
    ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}
