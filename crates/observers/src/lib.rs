//! Reusable observers for IQ calibration solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work across both solvers in `iqcal-solvers`.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits for cross-solver observers
//!   ([`HasPower`], [`CanStopEarly`])
//! - [`LogObserver`]: Reports solver progress through `tracing`
//!
//! # Features
//!
//! - `plot`: Enables [`PlotObserver`] for visualizing scans via egui.
//!   This feature adds dependencies on `eframe` and `egui_plot`.
//!
//! [`Observer`]: iqcal_core::Observer
//! [`HasPower`]: traits::HasPower
//! [`CanStopEarly`]: traits::CanStopEarly

mod log;
pub mod traits;

#[cfg(feature = "plot")]
mod plot;

pub use log::LogObserver;

#[cfg(feature = "plot")]
pub use plot::{PlotObserver, PlotWindow, Plottable, TraceStyle};
