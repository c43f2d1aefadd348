//! Visiting order over the discovered rooms.
//!
//! All-pairs hop distances come from one BFS per discovered room; the tour is
//! a greedy nearest-neighbor walk from the start room. No local-search
//! improvement is applied, so tour quality depends on the maze topology.

use super::route::Route;
use crate::graph::{distances_from, RoomGraph, RoomId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// `table[from][to]` = hop count. Unreachable pairs have no entry.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    table: HashMap<RoomId, HashMap<RoomId, u32>>,
}

impl DistanceTable {
    pub fn build(graph: &RoomGraph) -> Self {
        let table = graph
            .discovered()
            .iter()
            .map(|&room| (room, distances_from(graph, room)))
            .collect();
        Self { table }
    }

    pub fn get(&self, from: RoomId, to: RoomId) -> Option<u32> {
        self.table.get(&from).and_then(|row| row.get(&to)).copied()
    }
}

pub struct RouteOptimizer<'a> {
    graph: &'a RoomGraph,
}

impl<'a> RouteOptimizer<'a> {
    pub fn new(graph: &'a RoomGraph) -> Self {
        Self { graph }
    }

    /// Nearest-neighbor tour starting at `start`.
    ///
    /// Ties go to the candidate discovered first. Rooms that cannot be reached
    /// from the tour's current end are left out.
    pub fn compute(&self, start: RoomId) -> Route {
        if self.graph.is_empty() {
            return Route::default();
        }

        let distances = DistanceTable::build(self.graph);
        let rooms = self.graph.discovered();

        let mut path = vec![start];
        let mut visited: HashSet<RoomId> = HashSet::from([start]);
        let mut current = start;

        loop {
            let mut nearest: Option<(RoomId, u32)> = None;
            for &candidate in rooms {
                if visited.contains(&candidate) {
                    continue;
                }
                if let Some(distance) = distances.get(current, candidate) {
                    if nearest.map_or(true, |(_, best)| distance < best) {
                        nearest = Some((candidate, distance));
                    }
                }
            }

            let Some((next, distance)) = nearest else {
                break;
            };
            debug!("Route step {} -> {} ({} hops)", current, next, distance);
            path.push(next);
            visited.insert(next);
            current = next;
        }

        let omitted = rooms.iter().filter(|r| !visited.contains(r)).count();
        if omitted > 0 {
            debug!("{} discovered rooms unreachable from route end, omitted", omitted);
        }

        Route::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Field;

    fn framed(doors: Vec<Field>) -> Vec<Field> {
        let mut fields = vec![Field::new(0.0, 0.0), Field::new(10.0, 10.0)];
        fields.extend(doors);
        fields
    }

    fn east(target: RoomId) -> Field {
        Field::door(10.0, 5.0, target)
    }
    fn west(target: RoomId) -> Field {
        Field::door(0.0, 5.0, target)
    }
    fn south(target: RoomId) -> Field {
        Field::door(5.0, 10.0, target)
    }
    fn north(target: RoomId) -> Field {
        Field::door(5.0, 0.0, target)
    }

    #[test]
    fn test_three_room_forest() {
        let mut graph = RoomGraph::new([350, 351]);
        graph.track(300, Some("Indgang"), &framed(vec![east(301)]));
        graph.track(301, Some("Skov"), &framed(vec![west(300), south(302)]));
        graph.track(302, Some("Lysning"), &framed(vec![north(301)]));

        let table = DistanceTable::build(&graph);
        assert_eq!(table.get(300, 301), Some(1));
        assert_eq!(table.get(300, 302), Some(2));
        assert_eq!(table.get(301, 302), Some(1));

        let route = RouteOptimizer::new(&graph).compute(300);
        assert_eq!(route.rooms(), &[300, 301, 302]);
    }

    #[test]
    fn test_empty_graph_gives_empty_route() {
        let graph = RoomGraph::new([]);
        assert!(RouteOptimizer::new(&graph).compute(300).is_empty());
    }

    #[test]
    fn test_ties_follow_discovery_order() {
        // Hub 1 with two leaves at distance 1; leaf 3 discovered before leaf 2.
        let mut graph = RoomGraph::new([]);
        graph.track(1, Some("hub"), &framed(vec![east(2), west(3)]));
        graph.track(3, Some("left"), &framed(vec![east(1)]));
        graph.track(2, Some("right"), &framed(vec![west(1)]));

        let route = RouteOptimizer::new(&graph).compute(1);
        assert_eq!(route.rooms(), &[1, 3, 2]);
    }

    #[test]
    fn test_restored_graph_breaks_ties_the_same_way() {
        let mut graph = RoomGraph::new([]);
        graph.track(1, Some("hub"), &framed(vec![east(2), west(3)]));
        graph.track(3, Some("left"), &framed(vec![east(1)]));
        graph.track(2, Some("right"), &framed(vec![west(1)]));

        let restored =
            RoomGraph::from_rooms(graph.rooms().clone(), graph.discovered(), []);
        assert_eq!(
            RouteOptimizer::new(&restored).compute(1),
            RouteOptimizer::new(&graph).compute(1)
        );
        assert_eq!(RouteOptimizer::new(&restored).compute(1).rooms(), &[1, 3, 2]);
    }

    #[test]
    fn test_unreachable_rooms_are_omitted() {
        let mut graph = RoomGraph::new([]);
        graph.track(1, Some("a"), &framed(vec![east(2)]));
        graph.track(2, Some("b"), &framed(vec![]));
        graph.track(7, Some("island"), &framed(vec![]));

        let route = RouteOptimizer::new(&graph).compute(1);
        assert_eq!(route.rooms(), &[1, 2]);
    }

    #[test]
    fn test_each_room_at_most_once() {
        // 2x2 grid: 1 2 / 3 4, all two-way.
        let mut graph = RoomGraph::new([]);
        graph.track(1, Some("nw"), &framed(vec![east(2), south(3)]));
        graph.track(2, Some("ne"), &framed(vec![west(1), south(4)]));
        graph.track(3, Some("sw"), &framed(vec![north(1), east(4)]));
        graph.track(4, Some("se"), &framed(vec![north(2), west(3)]));

        let route = RouteOptimizer::new(&graph).compute(1);
        assert_eq!(route.first(), Some(1));
        assert_eq!(route.len(), 4);
        let unique: HashSet<_> = route.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_start_outside_discovered_set() {
        let mut graph = RoomGraph::new([]);
        graph.track(2, Some("b"), &framed(vec![east(3)]));
        graph.track(3, Some("c"), &framed(vec![]));

        // Nothing known leads out of room 1, so the tour is just the start.
        let route = RouteOptimizer::new(&graph).compute(1);
        assert_eq!(route.rooms(), &[1]);
    }
}
