//! Mixer gain/phase imbalance model and sideband suppression.
//!
//! An imbalanced mixer turns a circular I/Q drive into an ellipse: the I and Q
//! paths have gains `g_I` and `g_Q`, and their phases are off quadrature by
//! `φ`. The correction matrix pre-distorts the drive so the ellipse becomes a
//! circle again and the unwanted sideband cancels.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use iqcal_core::Measure;
use iqcal_solvers::nelder_mead::{Simplex, SimplexError};
use thiserror::Error;
use tracing::debug;

use crate::{MarkerReadout, Pause, Settle, measurement::Unsettled};

/// Drive angles measured by [`ImbalanceEstimate::from_probes`], in order.
pub const PROBE_ANGLES: [f64; 6] = [
    0.0,
    PI,
    FRAC_PI_2,
    3.0 * FRAC_PI_2,
    FRAC_PI_4,
    7.0 * FRAC_PI_4,
];

/// Errors raised while building a correction.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CorrectionError {
    #[error("correction parameters must be finite (g = {gain}, phi = {phase})")]
    NonFinite { gain: f64, phase: f64 },

    #[error("phase {phase} rad makes the correction singular")]
    Singular { phase: f64 },

    #[error("probe voltages must be finite and positive")]
    Probes,

    #[error("probe voltages imply |sin φ| = {0:.3} > 1")]
    PhaseOutOfRange(f64),
}

/// A 2×2 real matrix applied to the (I, Q) drive before the mixer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionMatrix([[f64; 2]; 2]);

impl CorrectionMatrix {
    #[must_use]
    pub fn identity() -> Self {
        Self([[1.0, 0.0], [0.0, 1.0]])
    }

    /// The correction for relative gain `g` and phase error `phi` (radians).
    ///
    /// `[[g, 0], [0, 1]] · (1 / cos φ) · [[cos φ/2, -sin φ/2], [-sin φ/2, cos φ/2]]`
    ///
    /// This suppresses the negative sideband; see [`positive_sideband`](Self::positive_sideband).
    ///
    /// # Errors
    ///
    /// Returns an error if either parameter is non-finite or `cos φ` is zero.
    pub fn from_imbalance(g: f64, phi: f64) -> Result<Self, CorrectionError> {
        if !g.is_finite() || !phi.is_finite() {
            return Err(CorrectionError::NonFinite {
                gain: g,
                phase: phi,
            });
        }

        let (s, c) = (phi / 2.0).sin_cos();
        let det = c * c - s * s;
        if det.abs() < 1e-12 {
            return Err(CorrectionError::Singular { phase: phi });
        }
        let k = 1.0 / det;

        Ok(Self([[g * k * c, -g * k * s], [-k * s, k * c]]))
    }

    /// The same correction mirrored to suppress the positive sideband.
    ///
    /// Right-multiplies by `diag(1, -1)`.
    #[must_use]
    pub fn positive_sideband(self) -> Self {
        let [[a, b], [c, d]] = self.0;
        Self([[a, -b], [c, -d]])
    }

    #[must_use]
    pub fn entries(&self) -> [[f64; 2]; 2] {
        self.0
    }

    /// Row-major `[m00, m01, m10, m11]`, the layout sequencer SDKs expect.
    #[must_use]
    pub fn flatten(&self) -> [f64; 4] {
        let [[a, b], [c, d]] = self.0;
        [a, b, c, d]
    }

    /// Applies the matrix to an (I, Q) pair.
    #[must_use]
    pub fn apply(&self, [i, q]: [f64; 2]) -> [f64; 2] {
        let [[a, b], [c, d]] = self.0;
        [a * i + b * q, c * i + d * q]
    }
}

impl Default for CorrectionMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Converts a power reading in dBm to a voltage amplitude across 50 Ω.
#[must_use]
pub fn dbm_to_volts(dbm: f64) -> f64 {
    (10f64.powf(dbm / 10.0) * 50.0).sqrt()
}

/// Drive points for the six imbalance probes: `offset + amplitude · (cos θ, sin θ)`
/// for each angle in [`PROBE_ANGLES`].
#[must_use]
pub fn probe_points(amplitude: f64, offset: [f64; 2]) -> [[f64; 2]; 6] {
    PROBE_ANGLES.map(|theta| {
        [
            offset[0] + amplitude * theta.cos(),
            offset[1] + amplitude * theta.sin(),
        ]
    })
}

/// Angles in a full response sweep.
pub const RESPONSE_POINTS: usize = 101;

/// The mixer's output at one drive angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsePoint {
    pub theta: f64,
    pub power_dbm: f64,
    pub volts: f64,
}

/// Drives `offset + amplitude · (cos θ, sin θ)` for `points` angles spread
/// evenly over `[0, 2π]`, both ends included, and reads the output at each.
///
/// The measured curve is what [`ImbalanceEstimate::model_volts`] predicts for a
/// well-fitted estimate.
///
/// # Errors
///
/// Returns the first measurement error unmodified.
pub fn response_curve<M: Measure<2>>(
    measure: &mut M,
    amplitude: f64,
    offset: [f64; 2],
    points: usize,
) -> Result<Vec<ResponsePoint>, M::Error> {
    let step = if points > 1 {
        TAU / (points - 1) as f64
    } else {
        0.0
    };

    let mut curve = Vec::with_capacity(points);
    for k in 0..points {
        let theta = step * k as f64;
        let (s, c) = theta.sin_cos();
        let power_dbm = measure.measure([offset[0] + amplitude * c, offset[1] + amplitude * s])?;
        curve.push(ResponsePoint {
            theta,
            power_dbm,
            volts: dbm_to_volts(power_dbm),
        });
    }
    Ok(curve)
}

/// Gain and phase imbalance estimated from the mixer's response to a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImbalanceEstimate {
    gain_i: f64,
    gain_q: f64,
    phase: f64,
}

impl ImbalanceEstimate {
    /// Estimates the imbalance from output voltages at the six [`PROBE_ANGLES`].
    ///
    /// `g_I` averages the 0 and π responses, `g_Q` the π/2 and 3π/2 ones, and the
    /// π/4 and 7π/4 responses give `sin φ = (v₄² - v₅²) / (2 g_I g_Q)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a voltage is not finite and positive, or the
    /// responses are inconsistent with any phase.
    pub fn from_probes(volts: [f64; 6]) -> Result<Self, CorrectionError> {
        if volts.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(CorrectionError::Probes);
        }

        let gain_i = (volts[0] + volts[1]) / 2.0;
        let gain_q = (volts[2] + volts[3]) / 2.0;
        let sin_phi = (volts[4].powi(2) - volts[5].powi(2)) / (2.0 * gain_i * gain_q);
        if sin_phi.abs() > 1.0 {
            return Err(CorrectionError::PhaseOutOfRange(sin_phi.abs()));
        }

        Ok(Self {
            gain_i,
            gain_q,
            phase: sin_phi.asin(),
        })
    }

    #[must_use]
    pub fn gain_i(&self) -> f64 {
        self.gain_i
    }

    #[must_use]
    pub fn gain_q(&self) -> f64 {
        self.gain_q
    }

    /// Phase error in radians.
    #[must_use]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// `g_Q / g_I`, the gain applied to the I path by the correction.
    #[must_use]
    pub fn gain_ratio(&self) -> f64 {
        self.gain_q / self.gain_i
    }

    /// Modeled output voltage when driving at angle `theta`.
    #[must_use]
    pub fn model_volts(&self, theta: f64) -> f64 {
        let (gi, gq) = (self.gain_i, self.gain_q);
        let (s, c) = theta.sin_cos();
        (gi * gi * c * c + gq * gq * s * s + gi * gq * self.phase.sin() * (2.0 * theta).sin())
            .sqrt()
    }

    /// The correction that inverts this imbalance.
    ///
    /// # Errors
    ///
    /// Returns an error if the estimated phase makes the matrix singular.
    pub fn correction(&self) -> Result<CorrectionMatrix, CorrectionError> {
        CorrectionMatrix::from_imbalance(self.gain_ratio(), self.phase)
    }
}

/// The initial `[g, φ]` simplex used to refine a model estimate.
///
/// `[[max(g - ε, 0), φ + ε], [min(g + ε, 1), φ + ε], [g, φ - ε]]`
///
/// # Errors
///
/// Returns an error if any vertex is non-finite.
pub fn imbalance_simplex(g: f64, phi: f64, eps: f64) -> Result<Simplex<2>, SimplexError> {
    Simplex::from_vertices(vec![
        [(g - eps).max(0.0), phi + eps],
        [(g + eps).min(1.0), phi + eps],
        [g, phi - eps],
    ])
}

/// Loads a correction matrix into the sequencer for one mixer.
pub trait CorrectionSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn apply_correction(&mut self, matrix: &CorrectionMatrix) -> Result<(), Self::Error>;
}

impl<F, E> CorrectionSink for F
where
    F: FnMut(&CorrectionMatrix) -> Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn apply_correction(&mut self, matrix: &CorrectionMatrix) -> Result<(), E> {
        self(matrix)
    }
}

/// Which sideband the correction suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sideband {
    #[default]
    Negative,
    Positive,
}

/// Errors raised by [`SidebandMeasurement`].
#[derive(Debug, Error)]
pub enum SidebandError<C, R> {
    #[error(transparent)]
    Correction(CorrectionError),

    #[error("failed to load correction matrix: {0}")]
    Sink(#[source] C),

    #[error("failed to read marker: {0}")]
    Readout(#[source] R),

    #[error("reading not settled within {timeout:?}")]
    NotSettled { timeout: std::time::Duration },
}

/// Measures unwanted-sideband power as a function of `[g, φ]`.
///
/// Each call builds the correction matrix, loads it, optionally restarts
/// averaging, settles, and reads the marker parked on the sideband.
pub struct SidebandMeasurement<C, R, P> {
    sink: C,
    readout: R,
    pause: P,
    settle: Settle,
    sideband: Sideband,
    restart_averaging: bool,
}

impl<C: CorrectionSink, R: MarkerReadout, P: Pause> SidebandMeasurement<C, R, P> {
    pub fn new(sink: C, readout: R, pause: P, settle: Settle, sideband: Sideband) -> Self {
        Self {
            sink,
            readout,
            pause,
            settle,
            sideband,
            restart_averaging: false,
        }
    }

    /// Restarts trace averaging after every matrix change.
    #[must_use]
    pub fn with_restart_averaging(mut self) -> Self {
        self.restart_averaging = true;
        self
    }

    /// The matrix a given `[g, φ]` maps to for this sideband.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters give no valid matrix.
    pub fn matrix(&self, [g, phi]: [f64; 2]) -> Result<CorrectionMatrix, CorrectionError> {
        let matrix = CorrectionMatrix::from_imbalance(g, phi)?;
        Ok(match self.sideband {
            Sideband::Negative => matrix,
            Sideband::Positive => matrix.positive_sideband(),
        })
    }

    pub fn into_parts(self) -> (C, R) {
        (self.sink, self.readout)
    }
}

impl<C: CorrectionSink, R: MarkerReadout, P: Pause> Measure<2> for SidebandMeasurement<C, R, P> {
    type Error = SidebandError<C::Error, R::Error>;

    fn measure(&mut self, x: [f64; 2]) -> Result<f64, Self::Error> {
        let matrix = self.matrix(x).map_err(SidebandError::Correction)?;
        self.sink
            .apply_correction(&matrix)
            .map_err(SidebandError::Sink)?;

        if self.restart_averaging {
            self.readout
                .restart_averaging()
                .map_err(SidebandError::Readout)?;
        }

        self.settle
            .wait(&mut self.readout, &mut self.pause)
            .map_err(|unsettled| match unsettled {
                Unsettled::Readout(error) => SidebandError::Readout(error),
                Unsettled::Timeout(timeout) => SidebandError::NotSettled { timeout },
            })?;

        let power = self
            .readout
            .marker_power()
            .map_err(SidebandError::Readout)?;
        debug!(g = x[0], phi = x[1], power, "sideband reading");
        Ok(power)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, convert::Infallible, rc::Rc, time::Duration};

    use approx::assert_relative_eq;
    use iqcal_solvers::nelder_mead;

    use super::*;
    use crate::testing::Bench;

    /// Output voltage of a mixer with the given imbalance, driven at `[i, q]`.
    fn mixer_volts(gain_i: f64, gain_q: f64, phi: f64, [i, q]: [f64; 2]) -> f64 {
        // Q path leads by phi: out = g_I i + g_Q q e^{j(π/2 - φ)}
        let re = gain_i * i + gain_q * q * phi.sin();
        let im = gain_q * q * phi.cos();
        re.hypot(im)
    }

    fn volts_to_dbm(volts: f64) -> f64 {
        10.0 * (volts * volts / 50.0).log10()
    }

    #[test]
    fn response_curve_matches_fitted_model() {
        let (gain_i, gain_q, phi) = (1.1, 0.8, -0.2);
        let mut drives = Vec::new();
        let mut measure = |x: [f64; 2]| -> Result<f64, Infallible> {
            drives.push(x);
            Ok(volts_to_dbm(mixer_volts(gain_i, gain_q, phi, x)))
        };
        let probes = probe_points(1.0, [0.0, 0.0]).map(|x| mixer_volts(gain_i, gain_q, phi, x));
        let estimate = ImbalanceEstimate::from_probes(probes).unwrap();

        let curve = response_curve(&mut measure, 1.0, [0.0, 0.0], RESPONSE_POINTS).unwrap();

        assert_eq!(curve.len(), RESPONSE_POINTS);
        assert_eq!(drives.len(), RESPONSE_POINTS);
        assert_relative_eq!(curve[0].theta, 0.0);
        assert_relative_eq!(curve[RESPONSE_POINTS - 1].theta, TAU, epsilon = 1e-12);
        for point in &curve {
            assert_relative_eq!(point.volts, estimate.model_volts(point.theta), epsilon = 1e-9);
        }
    }

    #[test]
    fn response_curve_centres_on_offset() {
        let mut drives = Vec::new();
        let mut measure = |x: [f64; 2]| -> Result<f64, Infallible> {
            drives.push(x);
            Ok(-20.0)
        };

        let curve = response_curve(&mut measure, 0.1, [0.2, -0.1], 5).unwrap();
        let empty = response_curve(&mut measure, 0.1, [0.0, 0.0], 0).unwrap();

        assert!(empty.is_empty());
        assert_eq!(drives.len(), 5);
        assert_relative_eq!(drives[0][0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(drives[0][1], -0.1, epsilon = 1e-12);
        assert_relative_eq!(drives[2][0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(curve[2].theta, PI, epsilon = 1e-12);
        assert_relative_eq!(curve[2].volts, dbm_to_volts(-20.0));
    }

    #[test]
    fn identity_at_zero_phase_and_unit_gain() {
        let matrix = CorrectionMatrix::from_imbalance(1.0, 0.0).unwrap();
        assert_eq!(matrix, CorrectionMatrix::identity());
    }

    #[test]
    fn from_imbalance_matches_closed_form() {
        let (g, phi) = (0.9, 0.2);
        let m = CorrectionMatrix::from_imbalance(g, phi).unwrap().entries();

        let k = 1.0 / phi.cos();
        assert_relative_eq!(m[0][0], g * k * (phi / 2.0).cos(), epsilon = 1e-12);
        assert_relative_eq!(m[0][1], -g * k * (phi / 2.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(m[1][0], -k * (phi / 2.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(m[1][1], k * (phi / 2.0).cos(), epsilon = 1e-12);
    }

    #[test]
    fn positive_sideband_negates_second_column() {
        let negative = CorrectionMatrix::from_imbalance(0.95, -0.1).unwrap();
        let positive = negative.positive_sideband();

        let [n, p] = [negative.flatten(), positive.flatten()];
        assert_eq!([p[0], p[2]], [n[0], n[2]]);
        assert_eq!([p[1], p[3]], [-n[1], -n[3]]);
        assert_eq!(positive.apply([0.0, 1.0]), [-n[1], -n[3]]);
    }

    #[test]
    fn rejects_singular_and_non_finite_parameters() {
        assert!(matches!(
            CorrectionMatrix::from_imbalance(1.0, FRAC_PI_2),
            Err(CorrectionError::Singular { .. })
        ));
        assert!(matches!(
            CorrectionMatrix::from_imbalance(f64::NAN, 0.0),
            Err(CorrectionError::NonFinite { .. })
        ));
    }

    #[test]
    fn dbm_to_volts_references_50_ohms() {
        assert_relative_eq!(dbm_to_volts(0.0), 50f64.sqrt());
        assert_relative_eq!(dbm_to_volts(-20.0), (0.01_f64 * 50.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn probes_trace_a_circle_around_the_offset() {
        let points = probe_points(0.1, [0.01, -0.02]);

        assert_relative_eq!(points[0][0], 0.11, epsilon = 1e-12);
        assert_relative_eq!(points[1][0], -0.09, epsilon = 1e-12);
        assert_relative_eq!(points[2][1], 0.08, epsilon = 1e-12);
        assert_relative_eq!(points[3][1], -0.12, epsilon = 1e-12);
        assert_relative_eq!(points[4][0], 0.01 + 0.1 * FRAC_PI_4.cos(), epsilon = 1e-12);
    }

    #[test]
    fn estimate_recovers_imbalance() {
        let (gain_i, gain_q, phi) = (1.2, 0.9, 0.15);
        let volts = probe_points(1.0, [0.0, 0.0]).map(|x| mixer_volts(gain_i, gain_q, phi, x));

        let estimate = ImbalanceEstimate::from_probes(volts).unwrap();

        assert_relative_eq!(estimate.gain_i(), gain_i, epsilon = 1e-12);
        assert_relative_eq!(estimate.gain_q(), gain_q, epsilon = 1e-12);
        assert_relative_eq!(estimate.phase(), phi, epsilon = 1e-12);
        assert_relative_eq!(estimate.gain_ratio(), 0.75, epsilon = 1e-12);

        for theta in [0.3_f64, 1.1, 2.5, 4.0] {
            let drive = [theta.cos(), theta.sin()];
            assert_relative_eq!(
                estimate.model_volts(theta),
                mixer_volts(gain_i, gain_q, phi, drive),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn estimate_rejects_bad_probes() {
        assert_eq!(
            ImbalanceEstimate::from_probes([1.0, 1.0, 1.0, 1.0, 0.0, 1.0]),
            Err(CorrectionError::Probes)
        );
        assert!(matches!(
            ImbalanceEstimate::from_probes([1.0, 1.0, 1.0, 1.0, 3.0, 0.1]),
            Err(CorrectionError::PhaseOutOfRange(_))
        ));
    }

    #[test]
    fn simplex_clamps_gain_into_unit_interval() {
        let simplex = imbalance_simplex(0.9, 0.05, 0.2).unwrap();
        let v = simplex.vertices();

        assert_relative_eq!(v[0][0], 0.7, epsilon = 1e-12);
        assert_relative_eq!(v[1][0], 1.0);
        assert_relative_eq!(v[2][1], -0.15, epsilon = 1e-12);

        let low = imbalance_simplex(0.1, 0.0, 0.2).unwrap();
        assert_relative_eq!(low.vertices()[0][0], 0.0);
    }

    /// Marker readout parked on the unwanted sideband of an imbalanced mixer.
    struct SidebandMarker {
        loaded: Rc<RefCell<CorrectionMatrix>>,
        gains: (f64, f64),
        phi: f64,
    }

    impl MarkerReadout for SidebandMarker {
        type Error = Infallible;

        fn marker_power(&mut self) -> Result<f64, Infallible> {
            // Residual ellipticity of a unit circle driven through the correction.
            let matrix = *self.loaded.borrow();
            let (gain_i, gain_q) = self.gains;
            let [a, b] = [0.0, FRAC_PI_2].map(|theta| {
                let drive = matrix.apply([theta.cos(), theta.sin()]);
                mixer_volts(gain_i, gain_q, self.phi, drive)
            });
            let [c, d] = [FRAC_PI_4, 7.0 * FRAC_PI_4].map(|theta| {
                let drive = matrix.apply([theta.cos(), theta.sin()]);
                mixer_volts(gain_i, gain_q, self.phi, drive)
            });
            let residual = (a - b).powi(2) + (c - d).powi(2);
            Ok(10.0 * (residual + 1e-12).log10())
        }

        fn peak_search(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn sideband_measurement_loads_matrix_before_reading() {
        let loaded = Rc::new(RefCell::new(CorrectionMatrix::identity()));
        let sink = {
            let loaded = Rc::clone(&loaded);
            move |matrix: &CorrectionMatrix| {
                *loaded.borrow_mut() = *matrix;
                Ok::<_, Infallible>(())
            }
        };
        let readout = SidebandMarker {
            loaded: Rc::clone(&loaded),
            gains: (1.0, 1.0),
            phi: 0.0,
        };
        let bench = Bench::default();
        let mut measurement = SidebandMeasurement::new(
            sink,
            readout,
            bench.pause(),
            Settle::Fixed(Duration::from_secs(1)),
            Sideband::Positive,
        );

        let power = measurement.measure([1.0, 0.0]).unwrap();

        assert_eq!(
            *loaded.borrow(),
            CorrectionMatrix::identity().positive_sideband()
        );
        assert!(power < -100.0);
        assert_eq!(bench.pauses(), [Duration::from_secs(1)]);
    }

    #[test]
    fn nelder_mead_refines_model_estimate() {
        let (gain_i, gain_q, phi) = (1.1, 1.0, 0.1);
        let loaded = Rc::new(RefCell::new(CorrectionMatrix::identity()));
        let sink = {
            let loaded = Rc::clone(&loaded);
            move |matrix: &CorrectionMatrix| {
                *loaded.borrow_mut() = *matrix;
                Ok::<_, Infallible>(())
            }
        };
        let readout = SidebandMarker {
            loaded: Rc::clone(&loaded),
            gains: (gain_i, gain_q),
            phi,
        };
        let bench = Bench::default();
        let mut measurement = SidebandMeasurement::new(
            sink,
            readout,
            bench.pause(),
            Settle::default(),
            Sideband::Negative,
        );

        let before = measurement.measure([1.0, 0.0]).unwrap();
        let simplex = imbalance_simplex(0.8, 0.0, 0.2).unwrap();
        let config = nelder_mead::Config::new(1e-6, 1e-3, 500, 1000).unwrap();
        let solution =
            nelder_mead::minimize_unobserved(&mut measurement, &simplex, &config).unwrap();

        assert!(solution.value < before - 20.0, "{} vs {}", solution.value, before);
    }
}
