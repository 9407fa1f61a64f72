//! Turns a resolved road network into ordered lane and line records, ready
//! to be appended to a vector map.

mod assembler;
mod error;
mod lane;

pub use assembler::{assemble, Assembly, KIND_ORDER};
pub use error::Error;
pub use lane::{Lane, Line, StopLine};
