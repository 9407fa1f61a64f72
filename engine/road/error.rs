#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid geometry for road {road}: {reason}")]
    GeometryError { road: String, reason: String },
}

impl Error {
    pub(crate) fn geometry<S: Into<String>>(road: &str, reason: S) -> Self {
        Error::GeometryError {
            road: road.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Fails with a [`Error::GeometryError`] unless `value` is finite and strictly positive.
pub(crate) fn require_positive(road: &str, name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::geometry(
            road,
            format!("{} must be positive, got {}", name, value),
        ))
    }
}

pub(crate) fn require_finite(road: &str, name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::geometry(
            road,
            format!("{} must be finite, got {}", name, value),
        ))
    }
}
