use serde::{Deserialize, Serialize};
use typed_id::{typed_id, zero_none};

typed_id!(PointId);
typed_id!(NodeId);
typed_id!(LineId);
typed_id!(DtLaneId);
typed_id!(LaneId);
typed_id!(WhiteLineId);
typed_id!(RoadEdgeId);

/// How a lane meets its neighbours at one of its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JunctionKind {
    Normal,
    LeftBranching,
    RightBranching,
    LeftMerging,
    RightMerging,
    Composition,
}

impl JunctionKind {
    pub fn code(&self) -> u8 {
        match self {
            JunctionKind::Normal => 0,
            JunctionKind::LeftBranching => 1,
            JunctionKind::RightBranching => 2,
            JunctionKind::LeftMerging => 3,
            JunctionKind::RightMerging => 4,
            JunctionKind::Composition => 5,
        }
    }
}

impl Default for JunctionKind {
    fn default() -> Self {
        JunctionKind::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnKind {
    Straight,
    LeftTurn,
    RightTurn,
}

impl TurnKind {
    pub fn code(&self) -> u8 {
        match self {
            TurnKind::Straight => 0,
            TurnKind::LeftTurn => 1,
            TurnKind::RightTurn => 2,
        }
    }
}

impl Default for TurnKind {
    fn default() -> Self {
        TurnKind::Straight
    }
}

/// Kind of a non-drivable line. Only center lines and edges become map markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Center,
    Edge,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub h: f64,
    /// Geodetic latitude and longitude; not computed, always zero.
    pub b: f64,
    pub l: f64,
    pub ref_frame: u32,
    pub mesh_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub point: PointId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: PointId,
    pub end: PointId,
    #[serde(with = "zero_none")]
    pub before: Option<LineId>,
    #[serde(with = "zero_none")]
    pub after: Option<LineId>,
}

/// Lane descriptor at the far end of one lane record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DtLane {
    pub point: PointId,
    /// Distance from the start of the appended lane.
    pub distance: f64,
    /// Direction from the previous point, radians counter-clockwise from +x.
    pub bearing: f64,
    pub apara: f64,
    pub radius: f64,
    pub slope: f64,
    pub cant: f64,
    pub left_width: f64,
    pub right_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub dtlane: DtLaneId,
    #[serde(with = "zero_none")]
    pub before: Option<LaneId>,
    #[serde(with = "zero_none")]
    pub after: Option<LaneId>,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub junction: JunctionKind,
    pub turn: TurnKind,
    pub span: f64,
    pub lane_count: u32,
    pub lane_number: u32,
    pub speed_limit: f64,
    pub ref_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhiteLine {
    pub line: LineId,
    pub node: NodeId,
    pub width: f64,
    pub color: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadEdge {
    pub line: LineId,
    pub node: NodeId,
}
