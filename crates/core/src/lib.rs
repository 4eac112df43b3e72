//! Core traits and types for IQ mixer calibration.
//!
//! This crate defines the shared abstractions that solvers, observers, and
//! instrument adapters build on:
//!
//! - [`Measure`]: a side-effecting black box that maps a point to a reading
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`OffsetDomain`]: the legal interval of a normalized DAC coordinate
//! - [`Sample`]: a measured `(I, Q) → power` triple

mod domain;
mod measure;
mod observer;
mod sample;

pub use domain::{DomainError, OffsetDomain};
pub use measure::Measure;
pub use observer::Observer;
pub use sample::Sample;
