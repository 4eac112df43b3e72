//! Nelder–Mead simplex search over `N` coordinates.
//!
//! # Algorithm
//!
//! The standard (non-adaptive) simplex method: each iteration replaces the
//! worst of the `N + 1` vertices by reflecting it through the centroid of the
//! others, expanding or contracting along that line, or shrinks the whole
//! simplex toward the best vertex. Coefficients are 1 (reflection), 2
//! (expansion), ½ (contraction), and ½ (shrink).
//!
//! The search converges when every vertex lies within `x_abs_tol` of the best
//! one on every axis and every value lies within `f_abs_tol` of the best value.
//!
//! # When to Use
//!
//! - The minimum is not aligned with the measurement axes, where alternating
//!   line scans stall
//! - The number of measurements does not need a fixed upper bound in advance
//!
//! # Limitations
//!
//! - Converges to a local minimum of the sampled function; not global
//! - Sensitive to measurement noise once the simplex is smaller than the noise
//!
//! # Observer Events
//!
//! - [`Event::Evaluated`]: after every successful measurement
//! - [`Event::MeasureFailed`]: before a measurement error is returned
//! - [`Event::Iterated`]: after each simplex update
//!
//! Observers can return [`Action::StopEarly`] to halt with the best vertex
//! measured so far.

mod action;
mod config;
mod error;
mod event;
mod search;
mod simplex;
mod solution;


pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::{Event, Move};
pub use simplex::{Simplex, SimplexError};
pub use solution::{Solution, Status, Vertex};

use iqcal_core::{Measure, Observer};

use search::search;

/// Finds a local minimum of the measurement with the Nelder–Mead method.
///
/// The initial `simplex` vertices are measured first, in order.
///
/// # Errors
///
/// Returns [`Error::Measure`] if a measurement fails.
pub fn minimize<M, Obs, const N: usize>(
    measure: &mut M,
    simplex: &Simplex<N>,
    config: &Config<N>,
    observer: Obs,
) -> Result<Solution<N>, Error<M::Error>>
where
    M: Measure<N>,
    Obs: for<'a> Observer<Event<'a, M, N>, Action>,
{
    search(measure, simplex, config, observer)
}

/// Finds a local minimum of the measurement without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns [`Error::Measure`] if a measurement fails.
pub fn minimize_unobserved<M, const N: usize>(
    measure: &mut M,
    simplex: &Simplex<N>,
    config: &Config<N>,
) -> Result<Solution<N>, Error<M::Error>>
where
    M: Measure<N>,
{
    minimize(measure, simplex, config, ())
}
