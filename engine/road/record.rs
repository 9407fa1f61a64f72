//! Per-segment parameter records, as handed over by the parser.
//!
//! The `type` tag selects the road kind at parse time; nothing downstream
//! inspects segment identifiers to find out what a segment is.

use enum_dispatch::enum_dispatch;
use geometry::{Coord, GeometrySampler};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::road::{Geometry, RoadKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    /// Transforms a point given in the frame of `origin` + `heading` into map coordinates.
    pub fn to_world(&self, origin: Coord, heading: f64) -> Coord {
        let (sin, cos) = heading.sin_cos();
        origin + Coord::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneSpec {
    pub lane_count: usize,
    pub lane_width: f64,
    /// Lanes before this index travel along the road, the rest against it.
    #[serde(default)]
    pub forward_lanes: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedSpec {
    #[serde(default)]
    pub speed_limit: Option<f64>,
    #[serde(default)]
    pub ref_speed: Option<f64>,
}

#[enum_dispatch]
pub trait RoadShape {
    fn kind(&self) -> RoadKind;

    fn speed(&self) -> SpeedSpec;

    fn build(&self, road: &str, sampler: &dyn GeometrySampler) -> Result<Geometry, Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub length: f64,
    #[serde(flatten)]
    pub lanes: LaneSpec,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub radius: f64,
    /// Heading change over the bend; positive turns left.
    pub angle: f64,
    #[serde(flatten)]
    pub lanes: LaneSpec,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvedRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub control1: LocalPoint,
    pub control2: LocalPoint,
    pub end: LocalPoint,
    #[serde(flatten)]
    pub lanes: LaneSpec,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roundabout {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    /// Radius of the ring lane's center.
    pub radius: f64,
    /// Exit directions relative to `heading`.
    pub exits: Vec<f64>,
    pub exit_length: f64,
    pub lane_width: f64,
    #[serde(flatten)]
    pub speed: SpeedSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XCrossing {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    /// Distance from the center to the end of each arm.
    pub size: f64,
    pub lane_width: f64,
    #[serde(flatten)]
    pub speed: SpeedSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YCrossing {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub size: f64,
    pub lane_width: f64,
    #[serde(flatten)]
    pub speed: SpeedSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub length: f64,
    #[serde(flatten)]
    pub lanes: LaneSpec,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub length: f64,
    #[serde(flatten)]
    pub lanes: LaneSpec,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterRoad {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub length: f64,
    pub lane_count: usize,
    pub lane_width_start: f64,
    pub lane_width_end: f64,
    #[serde(default)]
    pub forward_lanes: Option<usize>,
    #[serde(flatten)]
    pub speed: SpeedSpec,
    #[serde(default)]
    pub stop_line: bool,
}

#[enum_dispatch(RoadShape)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoadRecord {
    StraightRoad(StraightRoad),
    BendRoad(BendRoad),
    CurvedRoad(CurvedRoad),
    Roundabout(Roundabout),
    XCrossing(XCrossing),
    YCrossing(YCrossing),
    EntryRoad(EntryRoad),
    ExitRoad(ExitRoad),
    AdapterRoad(AdapterRoad),
}
