use serde::{Deserialize, Serialize};

/// End of a road, in its reference direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Start,
    End,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Start => write!(f, "start"),
            Side::End => write!(f, "end"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Road(#[from] road::Error),
    #[error("road {road} is defined twice")]
    DuplicateRoad { road: String },
    #[error("unresolved connectivity: {road}")]
    UnresolvedConnectivity { road: String },
    #[error("ambiguous connectivity at the {side} of {road}")]
    AmbiguousConnectivity { road: String, side: Side },
    #[error("found {0} issues in the road network")]
    Validation(usize),
}

impl Error {
    pub(crate) fn unresolved<S: Into<String>>(road: S) -> Self {
        Error::UnresolvedConnectivity { road: road.into() }
    }
}
