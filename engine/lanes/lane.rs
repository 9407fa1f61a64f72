use std::ops::RangeInclusive;

use geometry::Polyline;
use serde::{Deserialize, Serialize};
use vector_map::{JunctionKind, LaneAttributes, LaneId, LineId, LineKind, TurnKind, VectorMap};

use crate::error::Error;

/// One drivable lane, its points in travel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Road the lane was taken from.
    pub road: String,
    pub points: Polyline,
    pub junction_start: JunctionKind,
    pub junction_end: JunctionKind,
    pub turn_start: TurnKind,
    pub turn_end: TurnKind,
    pub speed_limit: f64,
    pub ref_speed: f64,
    pub closed_loop: bool,
}

impl Lane {
    /// `reverse` flips the points into travel order for lanes driven against their road.
    pub fn new(
        road: &str,
        mut points: Polyline,
        reverse: bool,
        speed_limit: f64,
        ref_speed: f64,
    ) -> Self {
        if reverse {
            points.reverse();
        }
        Self {
            road: road.to_owned(),
            points,
            junction_start: JunctionKind::Normal,
            junction_end: JunctionKind::Normal,
            turn_start: TurnKind::Straight,
            turn_end: TurnKind::Straight,
            speed_limit,
            ref_speed,
            closed_loop: false,
        }
    }

    pub fn with_junction(mut self, start: JunctionKind, end: JunctionKind) -> Self {
        self.junction_start = start;
        self.junction_end = end;
        self
    }

    pub fn with_turn(mut self, turn: TurnKind) -> Self {
        self.turn_start = turn;
        self.turn_end = turn;
        self
    }

    pub fn closed(mut self, closed_loop: bool) -> Self {
        self.closed_loop = closed_loop;
        self
    }

    pub fn append_to(&self, map: &mut VectorMap) -> Result<RangeInclusive<LaneId>, Error> {
        let attributes = LaneAttributes {
            junction_start: self.junction_start,
            junction_end: self.junction_end,
            turn_start: self.turn_start,
            turn_end: self.turn_end,
            speed_limit: self.speed_limit,
            ref_speed: self.ref_speed,
        };
        map.append_lane(&self.points, attributes, self.closed_loop)
            .map_err(|source| Error::Map {
                road: self.road.clone(),
                source,
            })
    }
}

/// A center line or road edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub road: String,
    pub points: Polyline,
    pub kind: LineKind,
    pub closed_loop: bool,
}

impl Line {
    pub fn new(road: &str, points: Polyline, kind: LineKind, closed_loop: bool) -> Self {
        Self {
            road: road.to_owned(),
            points,
            kind,
            closed_loop,
        }
    }

    pub fn append_to(&self, map: &mut VectorMap) -> Result<RangeInclusive<LineId>, Error> {
        map.append_line(&self.points, self.kind, self.closed_loop)
            .map_err(|source| Error::Map {
                road: self.road.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLine {
    pub road: String,
    pub points: Polyline,
}
