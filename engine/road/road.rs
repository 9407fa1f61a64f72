use geometry::{Coord, GeometrySampler, Offset, Polyline, Shape};
use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Error};
use crate::junction::{Approach, ExitLane};
use crate::layout::{LaneLayout, LanePolyline, LaneRole, TravelDirection};
use crate::record::{
    AdapterRoad, BendRoad, CurvedRoad, EntryRoad, ExitRoad, RoadRecord, RoadShape, SpeedSpec,
    StraightRoad,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoadHandle(u64);

impl RoadHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoadKind {
    Straight,
    Bend,
    Curved,
    Roundabout,
    XCrossing,
    YCrossing,
    Entry,
    Exit,
    Adapter,
}

impl RoadKind {
    pub fn is_junction(&self) -> bool {
        self.is_roundabout() || self.is_crossing()
    }

    pub fn is_roundabout(&self) -> bool {
        matches!(self, RoadKind::Roundabout)
    }

    pub fn is_crossing(&self) -> bool {
        matches!(self, RoadKind::XCrossing | RoadKind::YCrossing)
    }
}

/// Everything a road kind derives from its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub start: Coord,
    pub end: Coord,
    pub lanes: Vec<LanePolyline>,
    pub centers: Vec<Polyline>,
    pub edges: Vec<Polyline>,
    /// Edges end where they start (roundabout rings).
    pub closed_loop: bool,
    pub stop_line: Option<Polyline>,
    pub exits: Vec<ExitLane>,
    pub approaches: Vec<Approach>,
}

impl Geometry {
    pub(crate) fn junction(center: Coord) -> Self {
        Self {
            start: center,
            end: center,
            lanes: Vec::new(),
            centers: Vec::new(),
            edges: Vec::new(),
            closed_loop: false,
            stop_line: None,
            exits: Vec::new(),
            approaches: Vec::new(),
        }
    }
}

pub struct BuildContext<'a> {
    pub sampler: &'a dyn GeometrySampler,
    pub default_speed_limit: f64,
    pub default_ref_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub id: String,
    pub handle: RoadHandle,
    pub kind: RoadKind,
    pub speed_limit: f64,
    pub ref_speed: f64,
    geometry: Geometry,
    next: Option<RoadHandle>,
    previous: Option<RoadHandle>,
    is_turned: bool,
}

typed_id::id_cmp!(Road, handle);

impl Road {
    pub fn new(
        handle: RoadHandle,
        id: &str,
        record: &RoadRecord,
        context: &BuildContext,
    ) -> Result<Self, Error> {
        let SpeedSpec {
            speed_limit,
            ref_speed,
        } = record.speed();
        let speed_limit = speed_limit.unwrap_or(context.default_speed_limit);
        let ref_speed = ref_speed.unwrap_or(context.default_ref_speed);
        require_positive(id, "speed limit", speed_limit)?;
        require_positive(id, "reference speed", ref_speed)?;

        Ok(Self {
            id: id.to_owned(),
            handle,
            kind: record.kind(),
            speed_limit,
            ref_speed,
            geometry: record.build(id, context.sampler)?,
            next: None,
            previous: None,
            is_turned: false,
        })
    }

    pub fn start(&self) -> Coord {
        self.geometry.start
    }

    pub fn end(&self) -> Coord {
        self.geometry.end
    }

    pub fn lanes(&self) -> &[LanePolyline] {
        &self.geometry.lanes
    }

    pub fn centers(&self) -> &[Polyline] {
        &self.geometry.centers
    }

    pub fn edges(&self) -> &[Polyline] {
        &self.geometry.edges
    }

    pub fn closed_loop(&self) -> bool {
        self.geometry.closed_loop
    }

    pub fn stop_line(&self) -> Option<&Polyline> {
        self.geometry.stop_line.as_ref()
    }

    pub fn exits(&self) -> &[ExitLane] {
        &self.geometry.exits
    }

    pub fn exits_mut(&mut self) -> &mut [ExitLane] {
        &mut self.geometry.exits
    }

    pub fn approaches(&self) -> &[Approach] {
        &self.geometry.approaches
    }

    pub fn approaches_mut(&mut self) -> &mut [Approach] {
        &mut self.geometry.approaches
    }

    pub fn next(&self) -> Option<RoadHandle> {
        self.next
    }

    pub fn previous(&self) -> Option<RoadHandle> {
        self.previous
    }

    pub fn set_next(&mut self, next: Option<RoadHandle>) {
        self.next = next;
    }

    pub fn set_previous(&mut self, previous: Option<RoadHandle>) {
        self.previous = previous;
    }

    pub fn is_turned(&self) -> bool {
        self.is_turned
    }

    /**
     * Flips the road's reference direction in place: the link fields and end
     * points swap, every polyline is reversed, and the lanes and edges swap
     * sides so that no lane changes its physical direction of travel.
     *
     * Turning twice restores the original road.
     */
    pub fn turn_road(&mut self) {
        std::mem::swap(&mut self.next, &mut self.previous);

        let geometry = &mut self.geometry;
        std::mem::swap(&mut geometry.start, &mut geometry.end);
        for lane in geometry.lanes.iter_mut() {
            lane.turn();
        }
        geometry.lanes.reverse();
        for center in geometry.centers.iter_mut() {
            center.reverse();
        }
        for edge in geometry.edges.iter_mut() {
            edge.reverse();
        }
        geometry.edges.reverse();

        self.is_turned = !self.is_turned;
    }
}

pub(crate) fn require_pose(road: &str, x: f64, y: f64, heading: f64) -> Result<Coord, Error> {
    require_finite(road, "x", x)?;
    require_finite(road, "y", y)?;
    require_finite(road, "heading", heading)?;
    Ok(Coord::new(x, y))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Entry,
    Exit,
}

/// Samples the lanes, center and edges of a non-junction road around `shape`.
fn plain_geometry(
    road: &str,
    shape: Shape,
    layout: LaneLayout,
    ramp: Option<Ramp>,
    stop_line: bool,
    sampler: &dyn GeometrySampler,
) -> Result<Geometry, Error> {
    let mut lanes: Vec<LanePolyline> = layout
        .lane_offsets()
        .into_iter()
        .map(|(offset, direction)| {
            LanePolyline::new(
                sampler.polyline(&shape, offset),
                direction,
                LaneRole::Through,
            )
        })
        .collect();

    let mut right_edge = layout.right_edge();
    if let Some(ramp) = ramp {
        if layout.forward_lanes == 0 {
            return Err(Error::geometry(
                road,
                "a ramp needs at least one forward lane to attach to",
            ));
        }
        let outer = layout.beyond_right();
        let inner = Offset::taper(
            outer.start + layout.width_start,
            outer.end + layout.width_end,
        );
        let beyond_edge = Offset::taper(
            right_edge.start - layout.width_start,
            right_edge.end - layout.width_end,
        );
        let (lane_offset, edge_offset) = match ramp {
            Ramp::Entry => (
                Offset::taper(outer.start, inner.end),
                Offset::taper(beyond_edge.start, right_edge.end),
            ),
            Ramp::Exit => (
                Offset::taper(inner.start, outer.end),
                Offset::taper(right_edge.start, beyond_edge.end),
            ),
        };
        lanes.push(LanePolyline::new(
            sampler.polyline(&shape, lane_offset),
            TravelDirection::WithRoad,
            LaneRole::Ramp,
        ));
        right_edge = edge_offset;
    }

    let center = sampler.polyline(&shape, Offset::default());
    let right = sampler.polyline(&shape, right_edge);
    let left = sampler.polyline(&shape, layout.left_edge());

    let stop_line = match (stop_line, center.last(), right.last()) {
        (true, Some(center_end), Some(right_end)) => Some(vec![*center_end, *right_end]),
        _ => None,
    };

    Ok(Geometry {
        start: shape.start(),
        end: shape.end(),
        lanes,
        centers: vec![center],
        edges: vec![right, left],
        closed_loop: false,
        stop_line,
        exits: Vec::new(),
        approaches: Vec::new(),
    })
}

fn straight_shape(
    road: &str,
    x: f64,
    y: f64,
    heading: f64,
    length: f64,
) -> Result<Shape, Error> {
    let start = require_pose(road, x, y, heading)?;
    require_positive(road, "length", length)?;
    Ok(Shape::Line {
        start,
        heading,
        length,
    })
}

impl RoadShape for StraightRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Straight
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let shape = straight_shape(road, self.x, self.y, self.heading, self.length)?;
        let layout = LaneLayout::from_spec(road, &self.lanes)?;
        plain_geometry(road, shape, layout, None, self.stop_line, sampler)
    }
}

impl RoadShape for BendRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Bend
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let start = require_pose(road, self.x, self.y, self.heading)?;
        require_positive(road, "radius", self.radius)?;
        require_finite(road, "angle", self.angle)?;
        if self.angle == 0.0 || self.angle.abs() >= 2.0 * std::f64::consts::PI {
            return Err(Error::geometry(
                road,
                format!("bend angle must be within (0, 2pi), got {}", self.angle),
            ));
        }
        let layout = LaneLayout::from_spec(road, &self.lanes)?;
        if layout.max_abs_offset() >= self.radius {
            return Err(Error::geometry(
                road,
                format!(
                    "radius {} is too small for a road {} wide",
                    self.radius,
                    layout.max_abs_offset()
                ),
            ));
        }

        let shape = Shape::Arc {
            start,
            heading: self.heading,
            radius: self.radius,
            angle: self.angle,
        };
        plain_geometry(road, shape, layout, None, self.stop_line, sampler)
    }
}

impl RoadShape for CurvedRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Curved
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let origin = require_pose(road, self.x, self.y, self.heading)?;
        for point in [&self.control1, &self.control2, &self.end] {
            require_finite(road, "control point", point.x)?;
            require_finite(road, "control point", point.y)?;
        }
        if self.end.x == 0.0 && self.end.y == 0.0 {
            return Err(Error::geometry(road, "curve ends where it starts"));
        }
        let layout = LaneLayout::from_spec(road, &self.lanes)?;

        let shape = Shape::Bezier {
            p0: origin,
            p1: self.control1.to_world(origin, self.heading),
            p2: self.control2.to_world(origin, self.heading),
            p3: self.end.to_world(origin, self.heading),
        };
        plain_geometry(road, shape, layout, None, self.stop_line, sampler)
    }
}

impl RoadShape for EntryRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Entry
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let shape = straight_shape(road, self.x, self.y, self.heading, self.length)?;
        let layout = LaneLayout::from_spec(road, &self.lanes)?;
        plain_geometry(road, shape, layout, Some(Ramp::Entry), self.stop_line, sampler)
    }
}

impl RoadShape for ExitRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Exit
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let shape = straight_shape(road, self.x, self.y, self.heading, self.length)?;
        let layout = LaneLayout::from_spec(road, &self.lanes)?;
        plain_geometry(road, shape, layout, Some(Ramp::Exit), self.stop_line, sampler)
    }
}

impl RoadShape for AdapterRoad {
    fn kind(&self) -> RoadKind {
        RoadKind::Adapter
    }

    fn speed(&self) -> SpeedSpec {
        self.speed
    }

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error> {
        let shape = straight_shape(road, self.x, self.y, self.heading, self.length)?;
        let layout = LaneLayout::tapered(
            road,
            self.lane_count,
            self.forward_lanes,
            self.lane_width_start,
            self.lane_width_end,
        )?;
        plain_geometry(road, shape, layout, None, self.stop_line, sampler)
    }
}
