use thiserror::Error;

use super::Axis;

/// Errors that can occur during coordinate descent.
///
/// `E` is the measurement's error type, returned unmodified.
#[derive(Debug, Error)]
pub enum Error<E> {
    #[error("start {axis} = {value} is outside [{min}, {max})")]
    StartOutOfDomain {
        axis: Axis,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("measurement failed: {0}")]
    Measure(#[source] E),
}
