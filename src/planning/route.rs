use crate::graph::RoomId;
use serde::{Deserialize, Serialize};

/// Patrol visiting order. Serializes as a plain list of room ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<RoomId>);

impl Route {
    pub fn new(rooms: Vec<RoomId>) -> Self {
        Self(rooms)
    }

    pub fn rooms(&self) -> &[RoomId] {
        &self.0
    }

    pub fn first(&self) -> Option<RoomId> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.0.iter().copied()
    }
}
