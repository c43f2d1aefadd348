//! Breadth-first search over known exits.

use super::room::{RoomGraph, RoomId};
use std::collections::{HashMap, VecDeque};

/// Hop count from `start` to every room reachable over known exits, `start` included.
pub fn distances_from(graph: &RoomGraph, start: RoomId) -> HashMap<RoomId, u32> {
    let mut distances = HashMap::new();
    let mut queue = VecDeque::new();
    distances.insert(start, 0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let next_distance = distances[&current] + 1;
        for next in graph.neighbors(current) {
            if !distances.contains_key(&next) {
                distances.insert(next, next_distance);
                queue.push_back(next);
            }
        }
    }

    distances
}

/// Shortest room sequence from `from` to `to`, both ends included.
///
/// Returns `Some(vec![from])` when already there and `None` when `to` cannot
/// be reached over known exits.
pub fn shortest_path(graph: &RoomGraph, from: RoomId, to: RoomId) -> Option<Vec<RoomId>> {
    if from == to {
        return Some(vec![from]);
    }

    let mut parents: HashMap<RoomId, RoomId> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in graph.neighbors(current) {
            if next == from || parents.contains_key(&next) {
                continue;
            }
            parents.insert(next, current);
            if next == to {
                return Some(unwind(&parents, from, to));
            }
            queue.push_back(next);
        }
    }

    None
}

fn unwind(parents: &HashMap<RoomId, RoomId>, from: RoomId, to: RoomId) -> Vec<RoomId> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = parents[&current];
        path.push(current);
    }
    path.reverse();
    path
}
