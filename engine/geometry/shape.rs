use cgmath::InnerSpace;
use serde::{Deserialize, Serialize};

use crate::Coord;

/// Unit vector pointing along `heading` (radians, counter-clockwise from +x).
pub fn unit(heading: f64) -> Coord {
    Coord::new(heading.cos(), heading.sin())
}

/// Unit vector pointing 90 degrees to the left of `heading`.
pub fn left_normal(heading: f64) -> Coord {
    Coord::new(-heading.sin(), heading.cos())
}

/// Direction from `from` to `to`, in radians counter-clockwise from +x.
pub fn bearing(from: Coord, to: Coord) -> f64 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Coord,
    pub heading: f64,
}

/**
 * Lateral offset from a reference curve, positive to the left of the travel
 * direction. The offset is interpolated linearly over the fraction of arc
 * length travelled, which lets adapter segments and ramps taper.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub start: f64,
    pub end: f64,
}

impl Offset {
    pub fn constant(offset: f64) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn taper(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn at(&self, fraction: f64) -> f64 {
        self.start + (self.end - self.start) * fraction
    }

    pub fn max_abs(&self) -> f64 {
        self.start.abs().max(self.end.abs())
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Line {
        start: Coord,
        heading: f64,
        length: f64,
    },
    /// Circular arc; positive `angle` turns left.
    Arc {
        start: Coord,
        heading: f64,
        radius: f64,
        angle: f64,
    },
    /// Cubic Bezier curve through `p0` and `p3`.
    Bezier {
        p0: Coord,
        p1: Coord,
        p2: Coord,
        p3: Coord,
    },
    /// Full counter-clockwise circle, starting at polar angle `start_angle`.
    Circle {
        center: Coord,
        radius: f64,
        start_angle: f64,
    },
}

impl Shape {
    pub fn start(&self) -> Coord {
        match *self {
            Shape::Line { start, .. } | Shape::Arc { start, .. } => start,
            Shape::Bezier { p0, .. } => p0,
            Shape::Circle {
                center,
                radius,
                start_angle,
            } => center + unit(start_angle) * radius,
        }
    }

    pub fn end(&self) -> Coord {
        match *self {
            Shape::Bezier { p3, .. } => p3,
            Shape::Circle { .. } => self.start(),
            _ => self.pose_at_length(self.nominal_length()).position,
        }
    }

    /**
     * Length of the reference curve. Bezier curves have no closed form, so
     * this is a fine chord approximation; the sampler refines it.
     */
    pub fn nominal_length(&self) -> f64 {
        match *self {
            Shape::Line { length, .. } => length,
            Shape::Arc { radius, angle, .. } => radius * angle.abs(),
            Shape::Bezier { .. } => {
                const CHORDS: usize = 256;
                let chords: Vec<Coord> = (0..=CHORDS)
                    .map(|i| self.bezier_point(i as f64 / CHORDS as f64))
                    .collect();
                spline_util::polyline_length(&chords)
            }
            Shape::Circle { radius, .. } => 2.0 * std::f64::consts::PI * radius,
        }
    }

    /// Pose at arc length `s` for the analytic shapes.
    pub(crate) fn pose_at_length(&self, s: f64) -> Pose {
        match *self {
            Shape::Line {
                start,
                heading,
                ..
            } => Pose {
                position: start + unit(heading) * s,
                heading,
            },
            Shape::Arc {
                start,
                heading,
                radius,
                angle,
            } => {
                let turn = angle.signum();
                let center = start + left_normal(heading) * (radius * turn);
                let current = heading + turn * s / radius;
                Pose {
                    position: center - left_normal(current) * (radius * turn),
                    heading: current,
                }
            }
            Shape::Circle {
                center,
                radius,
                start_angle,
            } => {
                let polar = start_angle + s / radius;
                Pose {
                    position: center + unit(polar) * radius,
                    heading: polar + std::f64::consts::FRAC_PI_2,
                }
            }
            Shape::Bezier { .. } => {
                let length = self.nominal_length();
                let t = if length > 0.0 { s / length } else { 0.0 };
                self.bezier_pose(t)
            }
        }
    }

    pub(crate) fn bezier_point(&self, t: f64) -> Coord {
        match *self {
            Shape::Bezier { p0, p1, p2, p3 } => {
                let u = 1.0 - t;
                p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
            }
            _ => self.start(),
        }
    }

    pub(crate) fn bezier_pose(&self, t: f64) -> Pose {
        match *self {
            Shape::Bezier { p0, p1, p2, p3 } => {
                let u = 1.0 - t;
                let mut derivative =
                    (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t);
                if derivative.magnitude2() < 1e-18 {
                    // control point coincides with an end point
                    derivative = p3 - p0;
                }
                Pose {
                    position: self.bezier_point(t),
                    heading: derivative.y.atan2(derivative.x),
                }
            }
            _ => self.pose_at_length(0.0),
        }
    }
}
