//! TOML run settings.
//!
//! Every section and field has a default, so an empty file (or no file) is a
//! valid configuration. Values are checked by converting them into the solver
//! and instrument types.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use iqcal_core::OffsetDomain;
use iqcal_instruments::{AnalyzerOptions, Averaging, DriftPlan, Sweep};
use iqcal_solvers::{coordinate_descent, nelder_mead};
use serde::{Deserialize, Serialize};

use crate::logging::LogSettings;

/// Which solver drives a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    CoordinateDescent,
    NelderMead,
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub strategy: Strategy,
    pub start: StartSettings,
    pub domain: DomainSettings,
    pub coordinate_descent: CoordinateDescentSettings,
    pub nelder_mead: NelderMeadSettings,
    pub simulation: SimulationSettings,
    pub analyzer: AnalyzerSettings,
    pub generator: GeneratorSettings,
    pub drift: DriftSettings,
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartSettings {
    pub i: f64,
    pub q: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainSettings {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            min: -0.5,
            max: 0.5,
            step: OffsetDomain::DEFAULT_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinateDescentSettings {
    pub initial_range: f64,
    pub points_per_scan: usize,
    pub stop_threshold: f64,
    pub min_range: f64,
}

impl Default for CoordinateDescentSettings {
    fn default() -> Self {
        let config = coordinate_descent::Config::default();
        Self {
            initial_range: config.initial_range(),
            points_per_scan: config.points_per_scan(),
            stop_threshold: config.stop_threshold(),
            min_range: config.min_range(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NelderMeadSettings {
    pub x_abs_tol: f64,
    pub f_abs_tol: f64,
    pub max_iters: usize,
    pub max_evals: usize,

    /// Initial simplex vertices relative to the start point.
    pub simplex: Vec<[f64; 2]>,
}

impl Default for NelderMeadSettings {
    fn default() -> Self {
        let config = nelder_mead::Config::<2>::default();
        Self {
            x_abs_tol: config.x_abs_tol(),
            f_abs_tol: config.f_abs_tol(),
            max_iters: config.max_iters(),
            max_evals: config.max_evals(),
            simplex: vec![[-0.02, 0.02], [0.02, 0.02], [0.0, -0.02]],
        }
    }
}

/// A leaky mixer seen through an analyzer marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Offsets `[i, q]` that null the leakage.
    pub leakage: [f64; 2],

    /// Per-axis gain of the leakage amplitude.
    pub gains: [f64; 2],

    /// I/Q cross-coupling, in `(-1, 1)`.
    pub coupling: f64,

    /// Reading with a unit leakage amplitude, dBm.
    pub reference_dbm: f64,

    /// Analyzer noise floor, dBm.
    pub floor_dbm: f64,

    /// Half-width of uniform reading noise, dB. Zero disables noise.
    pub noise_db: f64,

    /// Noise seed. Unseeded runs draw from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            leakage: [0.0123, -0.0321],
            gains: [1.0, 1.0],
            coupling: 0.3,
            reference_dbm: 0.0,
            floor_dbm: -100.0,
            noise_db: 0.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerSettings {
    pub address: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub center_mhz: f64,
    pub span_hz: f64,
    pub rbw_hz: f64,
    pub points: u32,
    pub settle_ms: u64,

    /// Sweeps per average. Zero turns averaging off.
    pub averages: u32,
    pub auto_sweep_speed: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        let sweep = Sweep::tone(6000.0);
        Self {
            address: "192.168.1.10".into(),
            port: iqcal_instruments::TcpTransport::DEFAULT_PORT,
            timeout_ms: 5_000,
            center_mhz: sweep.center_mhz,
            span_hz: sweep.span_hz,
            rbw_hz: sweep.rbw_hz,
            points: sweep.points,
            settle_ms: u64::try_from(sweep.settle.as_millis()).unwrap_or(u64::MAX),
            averages: 0,
            auto_sweep_speed: AnalyzerOptions::default().auto_sweep_speed,
        }
    }
}

impl AnalyzerSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn sweep(&self) -> Sweep {
        Sweep {
            center_mhz: self.center_mhz,
            span_hz: self.span_hz,
            rbw_hz: self.rbw_hz,
            points: self.points,
            settle: Duration::from_millis(self.settle_ms),
        }
    }

    #[must_use]
    pub fn averaging(&self) -> Averaging {
        match self.averages {
            0 => Averaging::Off,
            n => Averaging::Count(n),
        }
    }

    #[must_use]
    pub fn options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            auto_sweep_speed: self.auto_sweep_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Anritsu,
    Dds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub kind: GeneratorKind,
    pub address: String,
    pub port: u16,
    pub timeout_ms: u64,

    /// DDS channel; ignored by other generators.
    pub channel: u8,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::Anritsu,
            address: "192.168.1.11".into(),
            port: iqcal_instruments::TcpTransport::DEFAULT_PORT,
            timeout_ms: 5_000,
            channel: 1,
        }
    }
}

impl GeneratorSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Warm-up before calibrating, and re-measurement of the result afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriftSettings {
    /// Wait before the first measurement. Zero skips the warm-up.
    pub warmup_ms: u64,
    pub interval_ms: u64,
    pub duration_ms: u64,
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            warmup_ms: 0,
            interval_ms: 1_000,
            duration_ms: 180_000,
        }
    }
}

impl DriftSettings {
    #[must_use]
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// # Errors
    ///
    /// Returns an error if the interval is zero or longer than the duration.
    pub fn plan(&self) -> Result<DriftPlan> {
        DriftPlan::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.duration_ms),
        )
        .context("invalid [drift]")
    }
}

impl Settings {
    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid settings TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The validated offset domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds or step are invalid.
    pub fn offset_domain(&self) -> Result<OffsetDomain> {
        let DomainSettings { min, max, step } = self.domain;
        OffsetDomain::new(min, max, step).context("invalid [domain]")
    }

    /// The validated coordinate-descent config over the configured domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain or any solver parameter is invalid.
    pub fn coordinate_descent(&self) -> Result<coordinate_descent::Config> {
        let s = self.coordinate_descent;
        let config = coordinate_descent::Config::new(
            s.initial_range,
            s.points_per_scan,
            s.stop_threshold,
            s.min_range,
        )
        .context("invalid [coordinate_descent]")?;
        Ok(config.with_domain(self.offset_domain()?))
    }

    /// The validated Nelder–Mead config, clipped to the offset domain, and its
    /// initial simplex around the start point.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain, a solver parameter, or the simplex is invalid.
    pub fn nelder_mead(&self) -> Result<(nelder_mead::Config<2>, nelder_mead::Simplex<2>)> {
        let s = &self.nelder_mead;
        let config = nelder_mead::Config::new(s.x_abs_tol, s.f_abs_tol, s.max_iters, s.max_evals)
            .context("invalid [nelder_mead]")?
            .with_domain(&self.offset_domain()?);
        let simplex = nelder_mead::Simplex::from_offsets(self.start_point(), &s.simplex)
            .context("invalid [nelder_mead] simplex")?;
        Ok((config, simplex))
    }

    #[must_use]
    pub fn start_point(&self) -> [f64; 2] {
        [self.start.i, self.start.q]
    }
}
