/// A measured simplex vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex<const N: usize> {
    /// The coordinates.
    pub x: [f64; N],

    /// The measured value at `x`.
    pub value: f64,
}

impl<const N: usize> Vertex<N> {
    #[must_use]
    pub fn new(x: [f64; N], value: f64) -> Self {
        Self { x, value }
    }
}

/// Why the Nelder–Mead search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,

    /// Reached the simplex update limit without converging.
    MaxIters,

    /// Exhausted the measurement budget without converging.
    MaxEvals,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a Nelder–Mead search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution<const N: usize> {
    /// Final solver status.
    pub status: Status,

    /// Best vertex found.
    pub x: [f64; N],

    /// Measured value at `x`.
    pub value: f64,

    /// Number of simplex updates.
    pub iters: usize,

    /// Number of measurements taken.
    pub evaluations: usize,
}
