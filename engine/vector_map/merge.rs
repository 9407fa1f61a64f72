use std::collections::HashMap;

use log::info;
use typed_id::TypedId;

use crate::entity::{LaneId, NodeId, PointId};
use crate::error::Error;
use crate::map::VectorMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub points_merged: usize,
    pub nodes_merged: usize,
}

/// Buckets canonical points by grid cell so each lookup only checks neighbouring cells.
struct PointGrid {
    cell: f64,
    cells: HashMap<(i64, i64), Vec<PointId>>,
}

impl PointGrid {
    fn new(cell: f64) -> Self {
        Self {
            cell,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        ((x / self.cell).floor() as i64, (y / self.cell).floor() as i64)
    }

    fn insert(&mut self, x: f64, y: f64, id: PointId) {
        let cell = self.cell_of(x, y);
        self.cells.entry(cell).or_default().push(id);
    }

    fn neighbours(&self, x: f64, y: f64) -> impl Iterator<Item = PointId> + '_ {
        let (cx, cy) = self.cell_of(x, y);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.cells.get(&cell))
            .flatten()
            .copied()
    }
}

impl VectorMap {
    /**
     * Collapses points that lie within the merge epsilon of an earlier point
     * onto the lowest such id, then collapses nodes that end up sharing a
     * point the same way. Both collections are compacted and every reference
     * into them is rewritten, so surviving records keep pointing at the same
     * coordinates.
     *
     * Running it again without appending anything in between changes nothing.
     */
    pub fn merge_redundant_points(&mut self) -> MergeReport {
        let epsilon = self.settings.merge_epsilon;

        // canonical point of every point, by old id
        let mut canonical: Vec<PointId> = Vec::with_capacity(self.points.len());
        let mut grid = PointGrid::new(epsilon.max(f64::MIN_POSITIVE));
        for (id, point) in self.points.iter() {
            let target = grid
                .neighbours(point.x, point.y)
                .filter(|other| {
                    let other = &self.points[*other];
                    (other.x - point.x).abs() <= epsilon
                        && (other.y - point.y).abs() <= epsilon
                        && other.h == point.h
                })
                .min();
            match target {
                Some(target) => canonical.push(target),
                None => {
                    grid.insert(point.x, point.y, id);
                    canonical.push(id);
                }
            }
        }

        let point_remap = self
            .points
            .compact(|id, _| canonical[id.position()] == id);
        let remap_point = |id: PointId| {
            point_remap
                .apply(canonical[id.position()])
                .unwrap_or(id)
        };
        for (_, node) in self.nodes.iter_mut() {
            node.point = remap_point(node.point);
        }
        for (_, line) in self.lines.iter_mut() {
            line.start = remap_point(line.start);
            line.end = remap_point(line.end);
        }
        for (_, dtlane) in self.dtlanes.iter_mut() {
            dtlane.point = remap_point(dtlane.point);
        }

        // lowest node on every point
        let mut owner: HashMap<PointId, NodeId> = HashMap::new();
        let mut canonical_nodes: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter() {
            canonical_nodes.push(*owner.entry(node.point).or_insert(id));
        }
        let node_remap = self
            .nodes
            .compact(|id, _| canonical_nodes[id.position()] == id);
        let remap_node = |id: NodeId| {
            node_remap
                .apply(canonical_nodes[id.position()])
                .unwrap_or(id)
        };
        for (_, lane) in self.lanes.iter_mut() {
            lane.start_node = remap_node(lane.start_node);
            lane.end_node = remap_node(lane.end_node);
        }
        for (_, white_line) in self.white_lines.iter_mut() {
            white_line.node = remap_node(white_line.node);
        }
        for (_, road_edge) in self.road_edges.iter_mut() {
            road_edge.node = remap_node(road_edge.node);
        }

        let report = MergeReport {
            points_merged: point_remap.dropped(),
            nodes_merged: node_remap.dropped(),
        };
        self.rebuild_lookup();
        self.merged = true;

        info!(
            "merged {} points and {} nodes, {} points and {} nodes left",
            report.points_merged,
            report.nodes_merged,
            self.points.len(),
            self.nodes.len()
        );
        report
    }

    /**
     * Re-chains lane records that meet at shared nodes. A record without a
     * predecessor gets the lowest-id record ending at its start node, one
     * without a successor the lowest-id record starting at its end node.
     * Links to records that don't touch the shared node are repaired the same
     * way.
     *
     * Only valid once `merge_redundant_points` has run.
     *
     * Returns the number of links changed.
     */
    pub fn rebuild_lane_conections(&mut self) -> Result<usize, Error> {
        if !self.merged {
            return Err(Error::PassOrder);
        }

        let mut ending_at: HashMap<NodeId, LaneId> = HashMap::new();
        let mut starting_at: HashMap<NodeId, LaneId> = HashMap::new();
        for (id, lane) in self.lanes.iter() {
            ending_at.entry(lane.end_node).or_insert(id);
            starting_at.entry(lane.start_node).or_insert(id);
        }

        let mut changed = 0;
        let ids: Vec<LaneId> = self.lanes.ids().collect();
        for id in ids {
            let lane = self.lanes[id];

            let before_ok = lane
                .before
                .and_then(|before| self.lanes.get(before))
                .map_or(false, |before| before.end_node == lane.start_node);
            if !before_ok {
                let before = ending_at
                    .get(&lane.start_node)
                    .copied()
                    .filter(|before| *before != id);
                if before != lane.before {
                    self.lanes[id].before = before;
                    changed += 1;
                }
            }

            let after_ok = lane
                .after
                .and_then(|after| self.lanes.get(after))
                .map_or(false, |after| after.start_node == lane.end_node);
            if !after_ok {
                let after = starting_at
                    .get(&lane.end_node)
                    .copied()
                    .filter(|after| *after != id);
                if after != lane.after {
                    self.lanes[id].after = after;
                    changed += 1;
                }
            }
        }

        info!("re-chained {} lane links", changed);
        Ok(changed)
    }

    /// Runs both repair passes in order.
    pub fn finalize(&mut self) -> Result<(MergeReport, usize), Error> {
        let report = self.merge_redundant_points();
        let changed = self.rebuild_lane_conections()?;
        Ok((report, changed))
    }
}

#[cfg(test)]
mod merge_tests {
    use crate::*;
    use geometry::Coord;
    use typed_id::TypedId;

    fn attributes() -> LaneAttributes {
        LaneAttributes {
            speed_limit: 40.0,
            ref_speed: 40.0,
            ..LaneAttributes::default()
        }
    }

    #[test]
    fn near_duplicates_collapse() {
        let mut map = VectorMap::default();
        let a = map
            .append_lane(&[Coord::new(0.0, 0.0), Coord::new(10.0, 0.0)], attributes(), false)
            .unwrap();
        let b = map
            .append_lane(
                &[Coord::new(10.0 + 1e-9, 0.0), Coord::new(20.0, 0.0)],
                attributes(),
                false,
            )
            .unwrap();
        assert_eq!(map.nodes.len(), 4);

        let report = map.merge_redundant_points();
        assert_eq!(
            report,
            MergeReport {
                points_merged: 1,
                nodes_merged: 1
            }
        );
        assert_eq!(map.points.len(), 3);
        assert_eq!(map.nodes.len(), 3);
        assert_eq!(map.lanes[*a.end()].end_node, map.lanes[*b.start()].start_node);
        for dtlane in map.dtlanes.values() {
            assert!(map.points.contains(dtlane.point));
        }
        let dtlane = map.dtlanes[map.lanes[*b.start()].dtlane];
        assert_eq!(map.point_coord(dtlane.point), Some(Coord::new(20.0, 0.0)));

        assert_eq!(map.merge_redundant_points(), MergeReport::default());
        assert_eq!(map.points.len(), 3);
    }

    #[test]
    fn rebuild_requires_merge() {
        let mut map = VectorMap::default();
        map.append_lane(&[Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)], attributes(), false)
            .unwrap();
        assert_eq!(map.rebuild_lane_conections(), Err(Error::PassOrder));
        map.merge_redundant_points();
        assert_eq!(map.rebuild_lane_conections(), Ok(0));

        // appending invalidates the merge
        map.append_lane(&[Coord::new(1.0, 0.0), Coord::new(2.0, 0.0)], attributes(), false)
            .unwrap();
        assert_eq!(map.rebuild_lane_conections(), Err(Error::PassOrder));
    }

    #[test]
    fn chains_meet_after_finalize() {
        let mut map = VectorMap::default();
        let a = map
            .append_lane(
                &[Coord::new(0.0, 0.0), Coord::new(5.0, 0.0), Coord::new(10.0, 0.0)],
                attributes(),
                false,
            )
            .unwrap();
        let b = map
            .append_lane(
                &[Coord::new(10.0, 1e-6), Coord::new(15.0, 0.0)],
                attributes(),
                false,
            )
            .unwrap();
        let (_, changed) = map.finalize().unwrap();
        assert_eq!(changed, 2);
        assert_eq!(map.lanes[*a.end()].after, Some(*b.start()));
        assert_eq!(map.lanes[*b.start()].before, Some(*a.end()));
        assert_eq!(map.lanes[*a.start()].before, None);

        let (report, changed) = map.finalize().unwrap();
        assert_eq!(report, MergeReport::default());
        assert_eq!(changed, 0);
        for lane in map.lanes.values() {
            for link in lane.before.iter().chain(lane.after.iter()) {
                assert!(map.lanes.contains(*link));
            }
        }
        assert_eq!(LaneId::from_index(3), *b.end());
    }
}
