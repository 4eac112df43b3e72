/// Why the coordinate-descent search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A Q scan read at or below the stop threshold.
    Converged,

    /// The scan window shrank below the minimum range first.
    ///
    /// This is not an error: the result is the best point found, and the
    /// caller decides whether its power is acceptable.
    RangeFloor,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a coordinate-descent search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Final I offset.
    pub i: f64,

    /// Final Q offset.
    pub q: f64,

    /// Reading at `(i, q)` from the last scan.
    pub power: f64,

    /// Number of completed iterations.
    pub iters: usize,

    /// Number of measurements taken.
    pub evaluations: usize,
}
