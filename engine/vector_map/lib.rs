//! The cross-referenced vector map: seven append-only collections of points,
//! nodes, lines, lane descriptors, lanes and markup, linked by 1-based ids.
//!
//! Lanes and lines come in as ordered polylines; [`VectorMap::append_lane`]
//! and [`VectorMap::append_line`] cut them into chained records, sharing
//! nodes with everything appended before wherever coordinates match exactly.
//! [`VectorMap::finalize`] then merges near-duplicate points and re-chains
//! the lanes that meet at merged nodes.

mod entity;
mod error;
mod map;
mod merge;
mod settings;

pub use entity::{
    DtLane, DtLaneId, JunctionKind, Lane, LaneId, Line, LineId, LineKind, Node, NodeId, Point,
    PointId, RoadEdge, RoadEdgeId, TurnKind, WhiteLine, WhiteLineId,
};
pub use error::Error;
pub use map::{LaneAttributes, VectorMap};
pub use merge::MergeReport;
pub use settings::MapSettings;
