use iqcal_core::Measure;

use super::Vertex;

/// How a simplex update replaced its worst vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Reflect,
    Expand,
    ContractOutside,
    ContractInside,
    Shrink,
}

/// Events emitted by the Nelder–Mead solver.
pub enum Event<'a, M, const N: usize>
where
    M: Measure<N>,
{
    /// A measurement succeeded.
    Evaluated {
        /// The (clipped) point measured.
        x: [f64; N],

        /// The measured value.
        value: f64,

        /// The best vertex measured so far, including this one.
        best: Vertex<N>,

        /// Total number of measurements so far, including this one.
        evaluation: usize,
    },

    /// A measurement failed. The error is returned after this event.
    MeasureFailed {
        /// The (clipped) point requested.
        x: [f64; N],

        /// The measurement error.
        error: &'a M::Error,
    },

    /// A simplex update finished.
    Iterated {
        /// One-based update number.
        iter: usize,

        /// How the worst vertex was replaced.
        step: Move,

        /// The best vertex of the updated simplex.
        best: Vertex<N>,

        /// Largest per-axis distance from any vertex to the best one.
        diameter: f64,
    },
}

impl<M, const N: usize> Event<'_, M, N>
where
    M: Measure<N>,
{
    /// Returns the best vertex known when the event was emitted.
    ///
    /// Returns `None` for [`Event::MeasureFailed`].
    #[must_use]
    pub fn best(&self) -> Option<Vertex<N>> {
        match self {
            Self::Evaluated { best, .. } | Self::Iterated { best, .. } => Some(*best),
            Self::MeasureFailed { .. } => None,
        }
    }
}
