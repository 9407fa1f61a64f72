use crate::entity::LineKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("a polyline needs at least two points, got {points}")]
    DegeneratePolyline { points: usize },
    #[error("lines of kind {0:?} can't be appended as markup")]
    InvalidLineKind(LineKind),
    #[error("lane connections can only be rebuilt after redundant points were merged")]
    PassOrder,
}
