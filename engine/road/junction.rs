use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geometry::{left_normal, unit, Coord, GeometrySampler, Offset, Polyline, Shape};
use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Error};
use crate::layout::{LanePolyline, LaneRole, TravelDirection};
use crate::record::{RoadShape, Roundabout, SpeedSpec, XCrossing, YCrossing};
use crate::road::{require_pose, Geometry, RoadHandle, RoadKind};

/**
 * One arm of a roundabout: a short two-lane stub leading from the ring
 * outwards. Its reference direction always points away from the ring, so
 * `start` lies on the ring and `end` is where the next road attaches. The
 * inner ends of its lanes are end points of the ring lanes.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitLane {
    pub index: usize,
    pub heading: f64,
    pub start: Coord,
    pub end: Coord,
    pub lanes: Vec<LanePolyline>,
    pub centers: Vec<Polyline>,
    pub edges: Vec<Polyline>,
    next: Option<RoadHandle>,
}

impl ExitLane {
    pub fn next(&self) -> Option<RoadHandle> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<RoadHandle>) {
        self.next = next;
    }
}

/// One arm of a crossing, with the turn lanes that start on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    pub index: usize,
    pub heading: f64,
    /// Outer end of the arm, where the next road attaches.
    pub end: Coord,
    /// Turn lanes run in travel order, from this arm into the target arm.
    pub left_turn: Option<Polyline>,
    pub right_turn: Option<Polyline>,
    pub stop_line: Polyline,
    next: Option<RoadHandle>,
}

impl Approach {
    pub fn next(&self) -> Option<RoadHandle> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<RoadHandle>) {
        self.next = next;
    }
}

impl RoadShape for Roundabout {
    fn kind(&self) -> RoadKind {
        RoadKind::Roundabout
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let center = require_pose(road, self.x, self.y, self.heading)?;
        require_positive(road, "radius", self.radius)?;
        require_positive(road, "exit length", self.exit_length)?;
        require_positive(road, "lane width", self.lane_width)?;
        if self.radius <= self.lane_width / 2.0 {
            return Err(Error::geometry(
                road,
                format!(
                    "ring radius {} leaves no room for lanes {} wide",
                    self.radius, self.lane_width
                ),
            ));
        }
        if self.exits.is_empty() {
            return Err(Error::geometry(road, "a roundabout needs at least one exit"));
        }

        let half_width = self.lane_width / 2.0;
        let ring = Shape::Circle {
            center,
            radius: self.radius,
            start_angle: self.heading,
        };
        // polar angle between an exit's axis and the ring points its lanes meet
        let attach = (half_width / self.radius).asin();

        for angle in &self.exits {
            require_finite(road, "exit angle", *angle)?;
        }
        let mut around: Vec<f64> = self
            .exits
            .iter()
            .map(|angle| angle.rem_euclid(TAU))
            .collect();
        around.sort_by(f64::total_cmp);
        if around.len() > 1 {
            let wrap = around[0] + TAU - around[around.len() - 1];
            let gaps = around.windows(2).map(|pair| pair[1] - pair[0]);
            if gaps.chain(std::iter::once(wrap)).any(|gap| gap <= 2.0 * attach) {
                return Err(Error::geometry(
                    road,
                    format!(
                        "exits closer than {:.3} rad overlap on a ring of radius {}",
                        2.0 * attach,
                        self.radius
                    ),
                ));
            }
        }

        // ring points by polar angle from the heading, in [0, 2pi)
        let ring_point = |angle: f64| {
            let angle = angle.rem_euclid(TAU);
            (angle, center + unit(self.heading + angle) * self.radius)
        };

        let mut geometry = Geometry::junction(center);
        geometry.closed_loop = true;
        // inner edge first; left of a counter-clockwise ring is its inside
        geometry.edges.push(sampler.polyline(&ring, Offset::constant(half_width)));
        geometry.edges.push(sampler.polyline(&ring, Offset::constant(-half_width)));

        let mut cuts = Vec::with_capacity(2 * self.exits.len());
        let reach = self.exit_length + self.radius * (1.0 - attach.cos());
        for (index, angle) in self.exits.iter().enumerate() {
            let heading = self.heading + angle;
            let start = center + unit(heading) * self.radius;
            let stub = Shape::Line {
                start,
                heading,
                length: self.exit_length,
            };
            // traffic leaves the ring just before the exit axis and joins just after it
            let branch = ring_point(angle - attach);
            let merge = ring_point(angle + attach);
            cuts.push(branch);
            cuts.push(merge);

            let outer = |offset: f64| stub.end() + left_normal(heading) * offset;
            let leaving = Shape::Line {
                start: branch.1,
                heading,
                length: reach,
            };
            let entering = Shape::Line {
                start: merge.1,
                heading,
                length: reach,
            };

            geometry.exits.push(ExitLane {
                index,
                heading,
                start,
                end: stub.end(),
                lanes: vec![
                    LanePolyline::new(
                        pinned(
                            sampler.polyline(&leaving, Offset::default()),
                            branch.1,
                            outer(-half_width),
                        ),
                        TravelDirection::WithRoad,
                        LaneRole::Through,
                    ),
                    LanePolyline::new(
                        pinned(
                            sampler.polyline(&entering, Offset::default()),
                            merge.1,
                            outer(half_width),
                        ),
                        TravelDirection::AgainstRoad,
                        LaneRole::Through,
                    ),
                ],
                centers: vec![sampler.polyline(&stub, Offset::default())],
                edges: vec![
                    sampler.polyline(&stub, Offset::constant(-self.lane_width)),
                    sampler.polyline(&stub, Offset::constant(self.lane_width)),
                ],
                next: None,
            });
        }

        // the ring lane is split at every exit so exit lanes end on ring nodes
        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (i, (from, from_point)) in cuts.iter().enumerate() {
            let (to, to_point) = match cuts.get(i + 1) {
                Some(next) => *next,
                None => (cuts[0].0 + TAU, cuts[0].1),
            };
            let arc = Shape::Arc {
                start: *from_point,
                heading: self.heading + from + FRAC_PI_2,
                radius: self.radius,
                angle: to - from,
            };
            geometry.lanes.push(LanePolyline::new(
                pinned(sampler.polyline(&arc, Offset::default()), *from_point, to_point),
                TravelDirection::WithRoad,
                LaneRole::Through,
            ));
        }

        Ok(geometry)
    }
}

/// Replaces the sampled end points with exact coordinates shared with other lanes.
fn pinned(mut points: Polyline, first: Coord, last: Coord) -> Polyline {
    if let Some(point) = points.first_mut() {
        *point = first;
    }
    if let Some(point) = points.last_mut() {
        *point = last;
    }
    points
}

/**
 * Builds a crossing with `arms` arms at right angles to each other, starting
 * at `heading` and going counter-clockwise. Opposite arms are joined by
 * straight lanes in both directions; every arm gets a left and a right turn
 * lane into its neighbours where those exist.
 */
fn crossing_geometry(
    road: &str,
    center: Coord,
    heading: f64,
    size: f64,
    lane_width: f64,
    arms: usize,
    sampler: &dyn GeometrySampler,
) -> Result<Geometry, Error> {
    require_positive(road, "size", size)?;
    require_positive(road, "lane width", lane_width)?;
    if size <= lane_width {
        return Err(Error::geometry(
            road,
            format!("crossing size {} is too small for lanes {} wide", size, lane_width),
        ));
    }

    let half_width = lane_width / 2.0;
    let arm_heading = |i: usize| heading + i as f64 * FRAC_PI_2;
    let arm_end = |i: usize| center + unit(arm_heading(i)) * size;
    // where incoming traffic enters the box, and outgoing traffic leaves it
    let entry = |i: usize| arm_end(i) + left_normal(arm_heading(i)) * half_width;
    let leave = |i: usize| arm_end(i) - left_normal(arm_heading(i)) * half_width;

    let mut geometry = Geometry::junction(center);

    for i in 0..2 {
        if i + 2 >= arms {
            continue;
        }
        let through = Shape::Line {
            start: arm_end(i),
            heading: arm_heading(i) + PI,
            length: 2.0 * size,
        };
        geometry.lanes.push(LanePolyline::new(
            sampler.polyline(&through, Offset::constant(-half_width)),
            TravelDirection::WithRoad,
            LaneRole::Through,
        ));
        geometry.lanes.push(LanePolyline::new(
            sampler.polyline(&through, Offset::constant(half_width)),
            TravelDirection::AgainstRoad,
            LaneRole::Through,
        ));
    }

    let turn_lane = |from: usize, to: usize| -> Option<Polyline> {
        if to >= arms {
            return None;
        }
        let p0 = entry(from);
        let p3 = leave(to);
        let reach = size * 0.5;
        let shape = Shape::Bezier {
            p0,
            p1: p0 - unit(arm_heading(from)) * reach,
            p2: p3 - unit(arm_heading(to)) * reach,
            p3,
        };
        Some(sampler.polyline(&shape, Offset::default()))
    };

    for i in 0..arms {
        geometry.approaches.push(Approach {
            index: i,
            heading: arm_heading(i),
            end: arm_end(i),
            left_turn: turn_lane(i, (i + 3) % 4),
            right_turn: turn_lane(i, (i + 1) % 4),
            stop_line: vec![
                arm_end(i),
                arm_end(i) + left_normal(arm_heading(i)) * lane_width,
            ],
            next: None,
        });
    }

    Ok(geometry)
}

impl RoadShape for XCrossing {
    fn kind(&self) -> RoadKind {
        RoadKind::XCrossing
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let center = require_pose(road, self.x, self.y, self.heading)?;
        crossing_geometry(road, center, self.heading, self.size, self.lane_width, 4, sampler)
    }
}

impl RoadShape for YCrossing {
    fn kind(&self) -> RoadKind {
        RoadKind::YCrossing
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let center = require_pose(road, self.x, self.y, self.heading)?;
        crossing_geometry(road, center, self.heading, self.size, self.lane_width, 3, sampler)
    }
}
