//! Simulator construction errors.

/// A simulator was configured with impossible parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulatorError {
    #[error("temperature range is empty: min {min} > max {max}")]
    EmptyRange { min: f64, max: f64 },

    #[error("invalid clock time {0:?}, expected HH:MM:SS")]
    InvalidTime(String),
}
