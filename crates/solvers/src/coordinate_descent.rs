//! Alternating-coordinate search for the minimum of an IQ measurement.
//!
//! # Algorithm
//!
//! Each iteration scans `points_per_scan` evenly spaced I values across a
//! window of width `range` centred on the current estimate (Q held fixed),
//! moves to the lowest reading, then does the same for Q with the new I held
//! fixed. The window is halved after every iteration. The search stops once
//! the last Q scan reads at or below `stop_threshold`, or once the window has
//! shrunk below `min_range`.
//!
//! Scan windows are clamped to the [`OffsetDomain`], so no measurement is
//! ever requested outside `[min, max - step]`.
//!
//! # When to Use
//!
//! - Each measurement is slow (instrument settle or averaging time)
//! - A bounded, predictable number of measurements matters more than
//!   finding the exact joint minimum
//!
//! # Limitations
//!
//! - Can stall in a valley that is not aligned with the I/Q axes; use
//!   [`nelder_mead`](crate::nelder_mead) for those
//! - Ties keep the earliest candidate in scan order
//!
//! # Observer Events
//!
//! - [`Event::Measured`]: after every successful measurement
//! - [`Event::MeasureFailed`]: before a measurement error is returned
//! - [`Event::IterationCompleted`]: after both scans of an iteration
//!
//! Observers can return [`Action::StopEarly`] from any event except
//! [`Event::MeasureFailed`] to halt with the current estimate. Measurement
//! errors are never recovered.
//!
//! [`OffsetDomain`]: iqcal_core::OffsetDomain

mod action;
mod axis;
mod config;
mod error;
mod event;
mod scan;
mod search;
mod solution;
mod state;


pub use action::Action;
pub use axis::Axis;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use iqcal_core::{Measure, Observer};

use search::search;

/// Finds the `(I, Q)` point minimizing the measurement.
///
/// `start` is the initial `[I, Q]` estimate. It must lie inside the config's
/// domain and is never clamped.
///
/// # Errors
///
/// Returns [`Error::StartOutOfDomain`] before any measurement if `start` is
/// outside the domain, and [`Error::Measure`] if a measurement fails.
pub fn minimize<M, Obs>(
    measure: &mut M,
    start: [f64; 2],
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error<M::Error>>
where
    M: Measure<2>,
    Obs: for<'a> Observer<Event<'a, M>, Action>,
{
    search(measure, start, config, observer)
}

/// Finds the `(I, Q)` point minimizing the measurement without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error if `start` is outside the domain or a measurement fails.
pub fn minimize_unobserved<M>(
    measure: &mut M,
    start: [f64; 2],
    config: &Config,
) -> Result<Solution, Error<M::Error>>
where
    M: Measure<2>,
{
    minimize(measure, start, config, ())
}
