//! Sampling of the parametric curves road segments are built from.
//!
//! The core of the converter only ever sees polylines; how a straight, bend,
//! Bezier or roundabout ring turns into points is decided by a
//! [`GeometrySampler`], which callers inject.

mod sampler;
mod shape;

pub use sampler::{GeometrySampler, Samples, UniformSampler};
pub use shape::{bearing, left_normal, unit, Offset, Pose, Shape};

pub type Coord = cgmath::Vector2<f64>;
pub type Polyline = Vec<Coord>;
