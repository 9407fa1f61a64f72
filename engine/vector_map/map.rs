use std::collections::HashMap;
use std::ops::RangeInclusive;

use geometry::Coord;
use log::debug;
use serde::{Deserialize, Serialize};
use typed_id::{IdVec, TypedId};

use crate::entity::*;
use crate::error::Error;
use crate::settings::{MapSettings, STRAIGHT_RADIUS};

/// Per-lane attributes handed to [`VectorMap::append_lane`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaneAttributes {
    pub junction_start: JunctionKind,
    pub junction_end: JunctionKind,
    pub turn_start: TurnKind,
    pub turn_end: TurnKind,
    pub speed_limit: f64,
    pub ref_speed: f64,
}

/// Exact-match lookup key; `-0.0` and `0.0` are the same coordinate.
pub(crate) fn coord_key(coord: Coord) -> (u64, u64) {
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorMap {
    pub points: IdVec<PointId, Point>,
    pub nodes: IdVec<NodeId, Node>,
    pub lines: IdVec<LineId, Line>,
    pub dtlanes: IdVec<DtLaneId, DtLane>,
    pub lanes: IdVec<LaneId, Lane>,
    pub white_lines: IdVec<WhiteLineId, WhiteLine>,
    pub road_edges: IdVec<RoadEdgeId, RoadEdge>,
    #[serde(skip)]
    pub(crate) settings: MapSettings,
    /// First node created at every coordinate seen so far.
    #[serde(skip)]
    pub(crate) node_lookup: HashMap<(u64, u64), NodeId>,
    #[serde(skip)]
    pub(crate) merged: bool,
}

impl VectorMap {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn point_coord(&self, point: PointId) -> Option<Coord> {
        self.points.get(point).map(|point| Coord::new(point.x, point.y))
    }

    pub fn node_coord(&self, node: NodeId) -> Option<Coord> {
        self.nodes
            .get(node)
            .and_then(|node| self.point_coord(node.point))
    }

    fn create_node(&mut self, coord: Coord) -> NodeId {
        let point = self.points.push(Point {
            x: coord.x,
            y: coord.y,
            h: 0.0,
            b: 0.0,
            l: 0.0,
            ref_frame: self.settings.ref_frame,
            mesh_code: self.settings.mesh_code,
        });
        let node = self.nodes.push(Node { point });
        self.node_lookup.entry(coord_key(coord)).or_insert(node);
        node
    }

    /// Reuses the node of an identical coordinate if there is one.
    fn resolve_node(&mut self, coord: Coord) -> NodeId {
        match self.node_lookup.get(&coord_key(coord)) {
            Some(node) => *node,
            None => self.create_node(coord),
        }
    }

    /// Nodes for every point of a polyline: shared at both ends, fresh in between.
    fn polyline_nodes(
        &mut self,
        polyline: &[Coord],
        closed_loop: bool,
    ) -> Result<Vec<NodeId>, Error> {
        if polyline.len() < 2 {
            return Err(Error::DegeneratePolyline {
                points: polyline.len(),
            });
        }
        self.merged = false;

        let last = polyline.len() - 1;
        let mut nodes = Vec::with_capacity(polyline.len());
        nodes.push(self.resolve_node(polyline[0]));
        for coord in &polyline[1..last] {
            nodes.push(self.create_node(*coord));
        }
        nodes.push(if closed_loop {
            nodes[0]
        } else {
            self.resolve_node(polyline[last])
        });
        Ok(nodes)
    }

    /**
     * Appends one drivable lane, given as a polyline in travel order.
     *
     * Every point after the first becomes one lane record, reaching from the
     * previous point's node to its own, with a lane descriptor placed on it.
     * Records are chained with `before`/`after`; a closed loop additionally
     * links its last record back to the first.
     *
     * Returns the ids of the first and last created lane records.
     */
    pub fn append_lane(
        &mut self,
        polyline: &[Coord],
        attributes: LaneAttributes,
        closed_loop: bool,
    ) -> Result<RangeInclusive<LaneId>, Error> {
        use cgmath::MetricSpace;
        use itertools::Itertools;

        let nodes = self.polyline_nodes(polyline, closed_loop)?;

        let mut distance = 0.0;
        let mut previous: Option<LaneId> = None;
        let mut first: Option<LaneId> = None;
        for ((from, to), (start_node, end_node)) in polyline
            .iter()
            .tuple_windows()
            .zip(nodes.iter().tuple_windows())
        {
            let span = from.distance(*to);
            distance += span;

            let point = self.nodes[*end_node].point;
            let dtlane = self.dtlanes.push(DtLane {
                point,
                distance,
                bearing: geometry::bearing(*from, *to),
                apara: 0.0,
                radius: STRAIGHT_RADIUS,
                slope: 0.0,
                cant: 0.0,
                left_width: self.settings.dtlane_left_width,
                right_width: self.settings.dtlane_right_width,
            });
            let lane = self.lanes.push(Lane {
                dtlane,
                before: previous,
                after: None,
                start_node: *start_node,
                end_node: *end_node,
                junction: JunctionKind::Normal,
                turn: TurnKind::Straight,
                span,
                lane_count: 1,
                lane_number: 1,
                speed_limit: attributes.speed_limit,
                ref_speed: attributes.ref_speed,
            });
            if let Some(previous) = previous {
                self.lanes[previous].after = Some(lane);
            }
            first.get_or_insert(lane);
            previous = Some(lane);
        }

        // polyline_nodes guarantees at least one lane record
        let (first, last) = match (first, previous) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(Error::DegeneratePolyline {
                    points: polyline.len(),
                })
            }
        };

        self.lanes[first].junction = attributes.junction_start;
        self.lanes[first].turn = attributes.turn_start;
        if first != last || attributes.junction_end != JunctionKind::Normal {
            self.lanes[last].junction = attributes.junction_end;
        }
        if first != last || attributes.turn_end != TurnKind::Straight {
            self.lanes[last].turn = attributes.turn_end;
        }
        if closed_loop {
            self.lanes[first].before = Some(last);
            self.lanes[last].after = Some(first);
        }

        debug!(
            "appended lane {}..={} ({} points, {:.1} long)",
            first,
            last,
            polyline.len(),
            distance
        );
        Ok(first..=last)
    }

    /**
     * Appends one markup line (a center line or a road edge) as a chain of
     * line records, each with its white line or road edge record.
     */
    pub fn append_line(
        &mut self,
        polyline: &[Coord],
        kind: LineKind,
        closed_loop: bool,
    ) -> Result<RangeInclusive<LineId>, Error> {
        use itertools::Itertools;

        if kind == LineKind::Stop {
            return Err(Error::InvalidLineKind(kind));
        }
        let nodes = self.polyline_nodes(polyline, closed_loop)?;

        let mut previous: Option<LineId> = None;
        let mut first: Option<LineId> = None;
        for (start_node, end_node) in nodes.iter().tuple_windows() {
            let line = self.lines.push(Line {
                start: self.nodes[*start_node].point,
                end: self.nodes[*end_node].point,
                before: previous,
                after: None,
            });
            if let Some(previous) = previous {
                self.lines[previous].after = Some(line);
            }
            match kind {
                LineKind::Center => {
                    self.white_lines.push(WhiteLine {
                        line,
                        node: *start_node,
                        width: self.settings.white_line_width,
                        color: self.settings.white_line_color,
                    });
                }
                _ => {
                    self.road_edges.push(RoadEdge {
                        line,
                        node: *start_node,
                    });
                }
            }
            first.get_or_insert(line);
            previous = Some(line);
        }

        let (first, last) = match (first, previous) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(Error::DegeneratePolyline {
                    points: polyline.len(),
                })
            }
        };
        if closed_loop {
            self.lines[first].before = Some(last);
            self.lines[last].after = Some(first);
        }
        Ok(first..=last)
    }

    /// Rebuilds the exact-match lookup after ids were renumbered.
    pub(crate) fn rebuild_lookup(&mut self) {
        let mut lookup = HashMap::new();
        for (id, node) in self.nodes.iter() {
            if let Some(point) = self.points.get(node.point) {
                lookup
                    .entry(coord_key(Coord::new(point.x, point.y)))
                    .or_insert(id);
            }
        }
        self.node_lookup = lookup;
    }

    /// Lane ids from the range returned by [`VectorMap::append_lane`].
    pub fn lane_ids(range: &RangeInclusive<LaneId>) -> impl Iterator<Item = LaneId> {
        (range.start().index()..=range.end().index()).map(LaneId::from_index)
    }
}
