//! Derivative-free minimizers for IQ mixer calibration.
//!
//! Both solvers drive a [`Measure`] black box and are interchangeable at that
//! boundary: anything that can be measured at `[I, Q]` can be handed to either.
//!
//! # Solvers
//!
//! - [`coordinate_descent`]: alternating I/Q line scans with a shrinking
//!   window; a small, bounded number of hardware measurements
//! - [`nelder_mead`]: simplex direct search; better when the leakage valley
//!   is not aligned with the I/Q axes
//!
//! [`Measure`]: iqcal_core::Measure

pub mod coordinate_descent;
pub mod nelder_mead;
