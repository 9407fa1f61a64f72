use std::collections::BTreeSet;

use geometry::{Coord, Polyline};
use log::{debug, info};
use network::RoadNetwork;
use road::{LaneRole, Road, RoadHandle, RoadKind};
use serde::{Deserialize, Serialize};
use vector_map::{JunctionKind, LineKind, TurnKind, VectorMap};

use crate::error::Error;
use crate::lane::{Lane, Line, StopLine};

/// Order in which road kinds are assembled.
pub const KIND_ORDER: [RoadKind; 9] = [
    RoadKind::Roundabout,
    RoadKind::XCrossing,
    RoadKind::YCrossing,
    RoadKind::Curved,
    RoadKind::Straight,
    RoadKind::Bend,
    RoadKind::Entry,
    RoadKind::Exit,
    RoadKind::Adapter,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub lanes: Vec<Lane>,
    pub lines: Vec<Line>,
    pub stop_lines: Vec<StopLine>,
}

impl Assembly {
    /// Appends every lane, then every line, in assembly order.
    pub fn append_to(&self, map: &mut VectorMap) -> Result<(), Error> {
        for lane in &self.lanes {
            lane.append_to(map)?;
        }
        for line in &self.lines {
            line.append_to(map)?;
        }
        info!(
            "vector map has {} points, {} nodes, {} lines, {} dtlanes, {} lanes, {} white lines, {} road edges",
            map.points.len(),
            map.nodes.len(),
            map.lines.len(),
            map.dtlanes.len(),
            map.lanes.len(),
            map.white_lines.len(),
            map.road_edges.len()
        );
        Ok(())
    }

    fn road_lane(road: &Road, points: &[Coord], reverse: bool) -> Lane {
        Lane::new(&road.id, points.to_vec(), reverse, road.speed_limit, road.ref_speed)
    }

    fn add_markup(
        &mut self,
        id: &str,
        centers: &[Polyline],
        edges: &[Polyline],
        closed_loop: bool,
    ) {
        for center in centers {
            self.lines
                .push(Line::new(id, center.clone(), LineKind::Center, closed_loop));
        }
        for edge in edges {
            self.lines
                .push(Line::new(id, edge.clone(), LineKind::Edge, closed_loop));
        }
    }

    fn add_roundabout(&mut self, road: &Road) {
        // the ring comes split at the exits, so its lanes are open
        for lane in road.lanes() {
            let lane = Self::road_lane(road, &lane.points, lane.is_reversed());
            self.lanes.push(lane);
        }
        self.add_markup(&road.id, road.centers(), road.edges(), road.closed_loop());

        for exit in road.exits() {
            for lane in &exit.lanes {
                let approaching = lane.is_reversed();
                let lane = Self::road_lane(road, &lane.points, approaching);
                let lane = if approaching {
                    lane.with_junction(JunctionKind::LeftMerging, JunctionKind::Normal)
                } else {
                    lane.with_junction(JunctionKind::Normal, JunctionKind::RightBranching)
                };
                self.lanes.push(lane);
            }
            self.add_markup(&road.id, &exit.centers, &exit.edges, false);
        }
    }

    fn add_crossing(&mut self, road: &Road) {
        for lane in road.lanes() {
            let lane = Self::road_lane(road, &lane.points, lane.is_reversed());
            self.lanes.push(lane);
        }

        for approach in road.approaches() {
            if let Some(left_turn) = &approach.left_turn {
                let lane = Self::road_lane(road, left_turn, false)
                    .with_junction(JunctionKind::LeftBranching, JunctionKind::RightMerging)
                    .with_turn(TurnKind::LeftTurn);
                self.lanes.push(lane);
            }
            if let Some(right_turn) = &approach.right_turn {
                let lane = Self::road_lane(road, right_turn, false)
                    .with_junction(JunctionKind::RightBranching, JunctionKind::LeftMerging)
                    .with_turn(TurnKind::RightTurn);
                self.lanes.push(lane);
            }
            self.stop_lines.push(StopLine {
                road: road.id.clone(),
                points: approach.stop_line.clone(),
            });
        }
    }

    fn add_plain(&mut self, road: &Road) {
        for lane in road.lanes() {
            let tagged = Self::road_lane(road, &lane.points, lane.is_reversed());
            let tagged = match (road.kind, lane.role) {
                (RoadKind::Entry, LaneRole::Ramp) => {
                    tagged.with_junction(JunctionKind::Normal, JunctionKind::LeftMerging)
                }
                (RoadKind::Exit, LaneRole::Ramp) => {
                    tagged.with_junction(JunctionKind::RightBranching, JunctionKind::Normal)
                }
                _ => tagged,
            };
            self.lanes.push(tagged);
        }
        self.add_markup(&road.id, road.centers(), road.edges(), road.closed_loop());

        if let Some(stop_line) = road.stop_line() {
            self.stop_lines.push(StopLine {
                road: road.id.clone(),
                points: stop_line.clone(),
            });
        }
    }

    fn add_road(&mut self, road: &Road) {
        match road.kind {
            RoadKind::Roundabout => self.add_roundabout(road),
            RoadKind::XCrossing | RoadKind::YCrossing => self.add_crossing(road),
            _ => self.add_plain(road),
        }
    }
}

/**
 * Orients the network's chains, then collects the lanes and lines of every
 * road, one road kind at a time in [`KIND_ORDER`] and in arena order within
 * a kind.
 *
 * Lanes come out in travel order. Junction and turn tags are set where lanes
 * split or join: the exits of roundabouts, the turn lanes of crossings and
 * the ramps of entry and exit roads.
 */
pub fn assemble(network: &mut RoadNetwork) -> Result<Assembly, Error> {
    network.orient()?;

    let mut remaining: BTreeSet<RoadHandle> = network.roads().map(|road| road.handle).collect();
    let mut assembly = Assembly::default();

    for kind in KIND_ORDER.iter() {
        let (lanes, lines) = (assembly.lanes.len(), assembly.lines.len());
        let mut count = 0;
        for road in network.roads().filter(|road| road.kind == *kind) {
            assembly.add_road(road);
            remaining.remove(&road.handle);
            count += 1;
        }
        if count > 0 {
            info!(
                "{:?}: {} roads, {} lanes, {} lines",
                kind,
                count,
                assembly.lanes.len() - lanes,
                assembly.lines.len() - lines
            );
        }
    }

    if !remaining.is_empty() {
        debug!("{} roads of no known kind were left out", remaining.len());
    }
    Ok(assembly)
}

#[cfg(test)]
mod assembler_tests {
    use crate::*;

    #[test]
    fn every_kind_is_assembled_once() {
        for (i, kind) in KIND_ORDER.iter().enumerate() {
            assert!(!KIND_ORDER[i + 1..].contains(kind));
        }
        assert_eq!(KIND_ORDER.len(), 9);
    }

    #[test]
    fn empty_network() {
        let mut network = network::RoadNetwork::new();
        assert_eq!(assemble(&mut network).unwrap(), Assembly::default());
    }
}
