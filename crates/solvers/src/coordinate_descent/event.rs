use iqcal_core::{Measure, Sample};

use super::Axis;

/// Events emitted by the coordinate-descent solver.
pub enum Event<'a, M>
where
    M: Measure<2>,
{
    /// A measurement succeeded.
    Measured {
        /// The axis being scanned.
        axis: Axis,

        /// The point just measured.
        sample: Sample,

        /// The best point of the current scan, including this one.
        best: Sample,

        /// Total number of measurements so far, including this one.
        evaluation: usize,
    },

    /// A measurement failed. The error is returned after this event.
    MeasureFailed {
        /// The axis being scanned.
        axis: Axis,

        /// The I offset that was requested.
        i: f64,

        /// The Q offset that was requested.
        q: f64,

        /// The measurement error.
        error: &'a M::Error,
    },

    /// Both scans of an iteration finished.
    IterationCompleted {
        /// One-based iteration number.
        iter: usize,

        /// Width of the scan window used by this iteration.
        range: f64,

        /// The new estimate and the reading of the Q scan's minimum.
        best: Sample,
    },
}

impl<M> Event<'_, M>
where
    M: Measure<2>,
{
    /// Returns the best point known when the event was emitted.
    ///
    /// Returns `None` for [`Event::MeasureFailed`].
    #[must_use]
    pub fn best(&self) -> Option<Sample> {
        match self {
            Self::Measured { best, .. } | Self::IterationCompleted { best, .. } => Some(*best),
            Self::MeasureFailed { .. } => None,
        }
    }

    /// Returns the axis being scanned, if the event belongs to a scan.
    #[must_use]
    pub fn axis(&self) -> Option<Axis> {
        match self {
            Self::Measured { axis, .. } | Self::MeasureFailed { axis, .. } => Some(*axis),
            Self::IterationCompleted { .. } => None,
        }
    }
}
