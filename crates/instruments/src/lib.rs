//! Instrument drivers and measurement adapters for IQ mixer calibration.
//!
//! The solvers in `iqcal-solvers` only see a [`Measure`] implementation. This
//! crate builds those from hardware seams:
//!
//! - [`MarkerMeasurement`] sets I/Q DC offsets through an [`OffsetSink`],
//!   settles, and reads a spectrum analyzer marker through a [`MarkerReadout`].
//! - [`SidebandMeasurement`] applies a gain/phase [`CorrectionMatrix`] through a
//!   [`CorrectionSink`] and reads the unwanted sideband the same way.
//!
//! Concrete drivers speak SCPI over a [`Transport`]:
//!
//! - [`SpectrumAnalyzer`]: Keysight N9010A-style analyzer
//! - [`AnritsuGenerator`] and [`DdsGenerator`]: LO sources behind [`SignalGenerator`]
//!
//! [`LdaAttenuator`] runs the LabBrick vendor program instead.
//!
//! [`monitor_drift`] re-measures a calibrated point over time, and
//! [`response_curve`] sweeps a drive circle to check an imbalance fit.
//!
//! Every delay goes through [`Pause`], so nothing here needs real time in tests.
//!
//! [`Measure`]: iqcal_core::Measure

mod analyzer;
mod attenuator;
mod correction;
mod drift;
mod generator;
mod measurement;
mod offset;
mod pause;
pub mod scpi;

#[cfg(test)]
mod testing;

pub use analyzer::{AnalyzerError, AnalyzerOptions, Averaging, SpectrumAnalyzer, Sweep, TracePoint};
pub use attenuator::{AttenuatorError, LdaAttenuator};
pub use correction::{
    CorrectionError, CorrectionMatrix, CorrectionSink, ImbalanceEstimate, PROBE_ANGLES,
    RESPONSE_POINTS, ResponsePoint, Sideband, SidebandError, SidebandMeasurement, dbm_to_volts,
    imbalance_simplex, probe_points, response_curve,
};
pub use drift::{DriftPlan, DriftPlanError, DriftReading, drift_span, monitor_drift, warm_up};
pub use generator::{AnritsuGenerator, DdsGenerator, SignalGenerator};
pub use measurement::{MarkerMeasurement, MarkerReadout, MeasurementError, Settle};
pub use offset::OffsetSink;
pub use pause::{Pause, ThreadPause};
pub use scpi::{TcpTransport, Transport, TransportError};
