use geometry::{Offset, Polyline};
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, Error};
use crate::record::LaneSpec;

/// Travel direction of a lane relative to its road's reference direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelDirection {
    WithRoad,
    AgainstRoad,
}

impl TravelDirection {
    pub fn flipped(self) -> Self {
        match self {
            TravelDirection::WithRoad => TravelDirection::AgainstRoad,
            TravelDirection::AgainstRoad => TravelDirection::WithRoad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneRole {
    Through,
    /// The extra lane of an entry or exit road.
    Ramp,
}

/**
 * One drivable lane of a road. The points always run in the road's
 * reference direction (previous -> next); `direction` says whether traffic
 * follows them or drives them backwards.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanePolyline {
    pub points: Polyline,
    pub direction: TravelDirection,
    pub role: LaneRole,
}

impl LanePolyline {
    pub fn new(points: Polyline, direction: TravelDirection, role: LaneRole) -> Self {
        Self {
            points,
            direction,
            role,
        }
    }

    /// Whether the points must be reversed to follow traffic.
    pub fn is_reversed(&self) -> bool {
        self.direction == TravelDirection::AgainstRoad
    }

    pub(crate) fn turn(&mut self) {
        self.points.reverse();
        self.direction = self.direction.flipped();
    }
}

/**
 * Lateral arrangement of the lanes around a road's reference curve.
 *
 * Lanes `0..forward_lanes` drive along the reference direction and sit to its
 * right; the remaining lanes drive against it and sit to its left. The
 * reference curve itself is the center line.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneLayout {
    pub lane_count: usize,
    pub forward_lanes: usize,
    pub width_start: f64,
    pub width_end: f64,
}

impl LaneLayout {
    pub fn from_spec(road: &str, spec: &LaneSpec) -> Result<Self, Error> {
        Self::tapered(
            road,
            spec.lane_count,
            spec.forward_lanes,
            spec.lane_width,
            spec.lane_width,
        )
    }

    pub fn tapered(
        road: &str,
        lane_count: usize,
        forward_lanes: Option<usize>,
        width_start: f64,
        width_end: f64,
    ) -> Result<Self, Error> {
        if lane_count == 0 {
            return Err(Error::geometry(road, "a road needs at least one lane"));
        }
        require_positive(road, "lane width", width_start)?;
        require_positive(road, "lane width", width_end)?;

        let forward_lanes = forward_lanes.unwrap_or((lane_count + 1) / 2);
        if forward_lanes > lane_count {
            return Err(Error::geometry(
                road,
                format!(
                    "{} forward lanes requested but the road only has {}",
                    forward_lanes, lane_count
                ),
            ));
        }

        Ok(Self {
            lane_count,
            forward_lanes,
            width_start,
            width_end,
        })
    }

    fn offset(&self, lanes: f64) -> Offset {
        Offset::taper(lanes * self.width_start, lanes * self.width_end)
    }

    /// Offsets of every lane center, forward lanes first, innermost first.
    pub fn lane_offsets(&self) -> Vec<(Offset, TravelDirection)> {
        let forward = (0..self.forward_lanes)
            .map(|i| (self.offset(-(i as f64 + 0.5)), TravelDirection::WithRoad));
        let backward = (0..self.lane_count - self.forward_lanes)
            .map(|j| (self.offset(j as f64 + 0.5), TravelDirection::AgainstRoad));
        forward.chain(backward).collect()
    }

    pub fn right_edge(&self) -> Offset {
        self.offset(-(self.forward_lanes as f64))
    }

    pub fn left_edge(&self) -> Offset {
        self.offset((self.lane_count - self.forward_lanes) as f64)
    }

    /// Offset one lane further right than the rightmost forward lane.
    pub fn beyond_right(&self) -> Offset {
        self.offset(-(self.forward_lanes as f64 + 0.5))
    }

    pub fn max_abs_offset(&self) -> f64 {
        self.right_edge().max_abs().max(self.left_edge().max_abs())
    }
}
