//! Calibration runs against a simulated mixer.

use std::convert::Infallible;

use anyhow::{Result, ensure};
use iqcal_core::{Measure, Observer};
use iqcal_instruments::{DriftReading, Pause, drift_span, monitor_drift, warm_up};
use iqcal_observers::LogObserver;
use iqcal_solvers::{coordinate_descent, nelder_mead};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::settings::{Settings, SimulationSettings, Strategy};

/// Carrier leakage of a mixer with DC offset errors, as an analyzer marker reads it.
///
/// The leakage amplitude is a coupled quadratic form around the null point:
/// `a² = (g_I Δi)² + (g_Q Δq)² + 2 c g_I g_Q Δi Δq`. The reading is
/// `reference + 10 log10(a² + floor)` plus optional uniform noise.
#[derive(Debug)]
pub struct SimulatedMixer {
    settings: SimulationSettings,
    floor: f64,
    rng: StdRng,
    readings: usize,
}

impl SimulatedMixer {
    /// # Errors
    ///
    /// Returns an error if the coupling is outside `(-1, 1)` or any value is non-finite.
    pub fn new(settings: SimulationSettings) -> Result<Self> {
        let SimulationSettings {
            leakage,
            gains,
            coupling,
            reference_dbm,
            floor_dbm,
            noise_db,
            seed,
        } = settings;

        ensure!(
            leakage.iter().chain(&gains).all(|v| v.is_finite()),
            "simulated leakage and gains must be finite"
        );
        ensure!(
            coupling.abs() < 1.0,
            "simulated coupling {coupling} must lie in (-1, 1)"
        );
        ensure!(
            reference_dbm.is_finite() && floor_dbm.is_finite(),
            "simulated reference and floor must be finite"
        );
        ensure!(
            noise_db.is_finite() && noise_db >= 0.0,
            "simulated noise must be finite and non-negative"
        );

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            settings,
            floor: 10f64.powf((floor_dbm - reference_dbm) / 10.0),
            rng,
            readings: 0,
        })
    }

    /// Number of readings taken so far.
    #[must_use]
    pub fn readings(&self) -> usize {
        self.readings
    }

    /// Noise-free reading at `[i, q]`.
    #[must_use]
    pub fn ideal(&self, [i, q]: [f64; 2]) -> f64 {
        let s = &self.settings;
        let di = s.gains[0] * (i - s.leakage[0]);
        let dq = s.gains[1] * (q - s.leakage[1]);
        let amplitude2 = di * di + dq * dq + 2.0 * s.coupling * di * dq;
        s.reference_dbm + 10.0 * (amplitude2 + self.floor).log10()
    }
}

impl Measure<2> for SimulatedMixer {
    type Error = Infallible;

    fn measure(&mut self, x: [f64; 2]) -> Result<f64, Infallible> {
        self.readings += 1;
        let half_width = self.settings.noise_db;
        let noise = if half_width > 0.0 {
            self.rng.gen_range(-half_width..=half_width)
        } else {
            0.0
        };
        Ok(self.ideal(x) + noise)
    }
}

/// Forwards every event to two observers. The first action returned wins.
pub struct Tee<A, B>(pub A, pub B);

impl<E, Act, A, B> Observer<E, Act> for Tee<A, B>
where
    A: Observer<E, Act>,
    B: Observer<E, Act>,
{
    fn observe(&mut self, event: &E) -> Option<Act> {
        let first = self.0.observe(event);
        let second = self.1.observe(event);
        first.or(second)
    }
}

/// Final calibration result, independent of the strategy used.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: String,
    pub i: f64,
    pub q: f64,
    pub power: f64,
    pub iters: usize,
    pub evaluations: usize,

    /// Re-measurements of the final point. Empty unless drift was requested.
    pub drift: Vec<DriftReading>,
}

impl From<coordinate_descent::Solution> for Outcome {
    fn from(solution: coordinate_descent::Solution) -> Self {
        Self {
            status: format!("{:?}", solution.status),
            i: solution.i,
            q: solution.q,
            power: solution.power,
            iters: solution.iters,
            evaluations: solution.evaluations,
            drift: Vec::new(),
        }
    }
}

impl From<nelder_mead::Solution<2>> for Outcome {
    fn from(solution: nelder_mead::Solution<2>) -> Self {
        Self {
            status: format!("{:?}", solution.status),
            i: solution.x[0],
            q: solution.x[1],
            power: solution.value,
            iters: solution.iters,
            evaluations: solution.evaluations,
            drift: Vec::new(),
        }
    }
}

/// Runs the configured strategy with `observer` attached.
///
/// # Errors
///
/// Returns an error if the solver settings are invalid or the start point is
/// outside the offset domain.
pub fn calibrate<M, O>(settings: &Settings, measure: &mut M, observer: O) -> Result<Outcome>
where
    M: Measure<2>,
    O: for<'a> Observer<coordinate_descent::Event<'a, M>, coordinate_descent::Action>
        + for<'a> Observer<nelder_mead::Event<'a, M, 2>, nelder_mead::Action>,
{
    let outcome = match settings.strategy {
        Strategy::CoordinateDescent => {
            let config = settings.coordinate_descent()?;
            coordinate_descent::minimize(measure, settings.start_point(), &config, observer)?
                .into()
        }
        Strategy::NelderMead => {
            let (config, simplex) = settings.nelder_mead()?;
            nelder_mead::minimize(measure, &simplex, &config, observer)?.into()
        }
    };
    Ok(outcome)
}

/// The `simulate` subcommand.
///
/// Warms up for `[drift] warmup_ms`, calibrates, and with `drift` set
/// re-measures the result according to the `[drift]` plan.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the plot window fails.
pub fn run<P: Pause>(settings: &Settings, plot: bool, drift: bool, pause: &mut P) -> Result<Outcome> {
    let mut mixer = SimulatedMixer::new(settings.simulation)?;
    let plan = drift.then(|| settings.drift.plan()).transpose()?;
    info!(
        strategy = ?settings.strategy,
        leakage = ?settings.simulation.leakage,
        "starting simulated calibration"
    );

    warm_up(pause, settings.drift.warmup());
    let mut outcome = if plot {
        plotted(settings, &mut mixer)?
    } else {
        calibrate(settings, &mut mixer, LogObserver)?
    };

    if let Some(plan) = plan {
        outcome.drift = monitor_drift(&mut mixer, pause, [outcome.i, outcome.q], &plan)?;
        info!(
            readings = outcome.drift.len(),
            span = ?drift_span(&outcome.drift),
            "drift measured"
        );
    }

    info!(
        status = %outcome.status,
        i = outcome.i,
        q = outcome.q,
        power = outcome.power,
        iters = outcome.iters,
        evaluations = outcome.evaluations,
        readings = mixer.readings(),
        "calibration finished"
    );
    Ok(outcome)
}

#[cfg(feature = "plot")]
fn plotted(settings: &Settings, mixer: &mut SimulatedMixer) -> Result<Outcome> {
    use iqcal_observers::{PlotObserver, PlotWindow, TraceStyle};

    let (names, window) = match settings.strategy {
        Strategy::CoordinateDescent => (
            ["I scan", "Q scan"],
            PlotWindow::new("Simulated LO leakage")
                .x_label("offset")
                .style(TraceStyle::Markers)
                .threshold(settings.coordinate_descent.stop_threshold),
        ),
        Strategy::NelderMead => (
            ["reading", "best"],
            PlotWindow::new("Simulated LO leakage").x_label("evaluation"),
        ),
    };
    let mut plot = PlotObserver::new(names);
    let outcome = calibrate(settings, mixer, Tee(LogObserver, &mut plot))?;

    plot.show(window)
        .map_err(|error| anyhow::anyhow!("plot window failed: {error}"))?;
    Ok(outcome)
}

#[cfg(not(feature = "plot"))]
fn plotted(_settings: &Settings, _mixer: &mut SimulatedMixer) -> Result<Outcome> {
    anyhow::bail!("plotting requires the `plot` feature")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    fn seeded(noise_db: f64) -> SimulationSettings {
        SimulationSettings {
            noise_db,
            seed: Some(42),
            ..SimulationSettings::default()
        }
    }

    #[test]
    fn reads_floor_at_the_null() {
        let mixer = SimulatedMixer::new(SimulationSettings::default()).unwrap();
        let null = SimulationSettings::default().leakage;

        assert_relative_eq!(mixer.ideal(null), -100.0, epsilon = 1e-9);
        assert!(mixer.ideal([0.0, 0.0]) > -40.0);
    }

    #[test]
    fn seeded_noise_is_reproducible_and_bounded() {
        let mut a = SimulatedMixer::new(seeded(0.5)).unwrap();
        let mut b = SimulatedMixer::new(seeded(0.5)).unwrap();

        for k in 0u8..50 {
            let x = [0.01 * f64::from(k), -0.005 * f64::from(k)];
            let ra = a.measure(x).unwrap();
            assert_eq!(ra, b.measure(x).unwrap());
            assert!((ra - a.ideal(x)).abs() <= 0.5);
        }
        assert_eq!(a.readings(), 50);
    }

    #[test]
    fn rejects_degenerate_coupling() {
        let settings = SimulationSettings {
            coupling: 1.0,
            ..SimulationSettings::default()
        };
        assert!(SimulatedMixer::new(settings).is_err());
    }

    #[test]
    fn coordinate_descent_finds_the_null() {
        let settings = Settings::default();
        let mut mixer = SimulatedMixer::new(seeded(0.0)).unwrap();

        let outcome = calibrate(&settings, &mut mixer, ()).unwrap();

        assert!(outcome.power < -60.0, "power {}", outcome.power);
        assert_relative_eq!(outcome.i, 0.0123, epsilon = 1e-3);
        assert_relative_eq!(outcome.q, -0.0321, epsilon = 1e-3);
        assert_eq!(outcome.evaluations, mixer.readings());
    }

    #[test]
    fn nelder_mead_finds_the_null() {
        let settings = Settings {
            strategy: Strategy::NelderMead,
            ..Settings::default()
        };
        let mut mixer = SimulatedMixer::new(seeded(0.0)).unwrap();

        let outcome = calibrate(&settings, &mut mixer, ()).unwrap();

        assert!(outcome.power < -60.0, "power {}", outcome.power);
        assert_relative_eq!(outcome.i, 0.0123, epsilon = 1e-3);
        assert_relative_eq!(outcome.q, -0.0321, epsilon = 1e-3);
    }

    #[test]
    fn tee_forwards_to_both_and_keeps_first_action() {
        let mut left = 0;
        let mut right = 0;
        let mut tee = Tee(
            |_: &u8| {
                left += 1;
                None::<&str>
            },
            |e: &u8| {
                right += 1;
                (*e == 2).then_some("stop")
            },
        );

        assert_eq!(tee.observe(&1u8), None);
        assert_eq!(tee.observe(&2u8), Some("stop"));
        drop(tee);
        assert_eq!((left, right), (2, 2));
    }

    /// Records pauses instead of sleeping.
    #[derive(Default)]
    struct Clock(Vec<Duration>);

    impl Pause for Clock {
        fn pause(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    #[test]
    fn run_warms_up_then_measures_drift_at_the_result() {
        let settings = Settings::from_toml(
            "[simulation]\nseed = 1\n[drift]\nwarmup_ms = 5000\ninterval_ms = 1000\nduration_ms = 3000\n",
        )
        .unwrap();
        let mut clock = Clock::default();

        let outcome = run(&settings, false, true, &mut clock).unwrap();

        let second = Duration::from_secs(1);
        assert_eq!(clock.0, [Duration::from_secs(5), second, second]);
        assert_eq!(outcome.drift.len(), 3);
        for reading in &outcome.drift {
            assert_eq!(reading.sample.point(), [outcome.i, outcome.q]);
            assert_relative_eq!(reading.sample.power, outcome.power);
        }
    }

    #[test]
    fn run_without_drift_only_warms_up() {
        let settings = Settings::from_toml("[drift]\nwarmup_ms = 250\n").unwrap();
        let mut clock = Clock::default();

        let outcome = run(&settings, false, false, &mut clock).unwrap();

        assert!(outcome.drift.is_empty());
        assert_eq!(clock.0, [Duration::from_millis(250)]);
    }

    #[test]
    fn invalid_drift_plan_fails_before_calibrating() {
        let settings = Settings::from_toml("[drift]\nwarmup_ms = 250\ninterval_ms = 0\n").unwrap();
        let mut clock = Clock::default();

        assert!(run(&settings, false, true, &mut clock).is_err());
        assert!(clock.0.is_empty());
    }

    #[test]
    fn start_outside_domain_is_an_error() {
        let settings = Settings::from_toml("[start]\ni = 0.7\n").unwrap();
        let mut mixer = SimulatedMixer::new(seeded(0.0)).unwrap();

        assert!(calibrate(&settings, &mut mixer, ()).is_err());
        assert_eq!(mixer.readings(), 0);
    }
}
