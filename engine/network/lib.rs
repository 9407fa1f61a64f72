//! Connectivity between independently authored road segments.
//!
//! Roads only know their own geometry. The [`RoadNetwork`] links them up by
//! comparing end points, fixes roads that were authored against the flow of
//! their chain, and walks chains up to the next junction.

mod error;
mod network;
mod path;
mod resolve;

pub use error::{Error, Side};
pub use network::RoadNetwork;
pub use path::{Path, PathItem};
