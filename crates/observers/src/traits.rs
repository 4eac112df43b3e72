//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, so one
//! observer can drive either the coordinate-descent or the Nelder–Mead search.
//!
//! # Event traits
//!
//! - [`HasPower`]: events that carry a power reading
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use iqcal_core::Observer;
//! use iqcal_observers::traits::{CanStopEarly, HasPower};
//!
//! /// Stops once any reading drops below the analyzer noise floor.
//! struct NoiseFloor {
//!     dbm: f64,
//! }
//!
//! impl<E: HasPower, A: CanStopEarly> Observer<E, A> for NoiseFloor {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.power() <= self.dbm).then(A::stop_early)
//!     }
//! }
//! ```

use iqcal_core::Measure;
use iqcal_solvers::{coordinate_descent, nelder_mead};

/// An event that carries a power reading.
pub trait HasPower {
    /// Returns the power for this event.
    ///
    /// Returns `f64::NAN` when the event represents a failed measurement and
    /// no reading is available.
    fn power(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- HasPower for coordinate_descent::Event ---

impl<M: Measure<2>> HasPower for coordinate_descent::Event<'_, M> {
    /// The reading just taken, or the best reading at the end of an iteration.
    fn power(&self) -> f64 {
        match self {
            coordinate_descent::Event::Measured { sample, .. } => sample.power,
            coordinate_descent::Event::IterationCompleted { best, .. } => best.power,
            coordinate_descent::Event::MeasureFailed { .. } => f64::NAN,
        }
    }
}

// --- HasPower for nelder_mead::Event ---

impl<M: Measure<N>, const N: usize> HasPower for nelder_mead::Event<'_, M, N> {
    fn power(&self) -> f64 {
        match self {
            nelder_mead::Event::Evaluated { value, .. } => *value,
            nelder_mead::Event::Iterated { best, .. } => best.value,
            nelder_mead::Event::MeasureFailed { .. } => f64::NAN,
        }
    }
}

// --- CanStopEarly impls ---

impl CanStopEarly for coordinate_descent::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

impl CanStopEarly for nelder_mead::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
