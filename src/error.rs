use std::fmt;

/// Errors raised at the boundaries of the simulation core (body creation and
/// configuration). The physics step itself never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Body mass was zero, negative or not finite.
    InvalidMass(f64),
    /// Body radius was negative or not finite.
    InvalidRadius(f64),
    /// A position or velocity component was NaN or infinite.
    NonFinite(&'static str),
    InvalidConfig(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidMass(m) => write!(f, "body mass must be positive and finite, got {m}"),
            SimError::InvalidRadius(r) => {
                write!(f, "body radius must be non-negative and finite, got {r}")
            }
            SimError::NonFinite(what) => write!(f, "body {what} has a non-finite component"),
            SimError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}
