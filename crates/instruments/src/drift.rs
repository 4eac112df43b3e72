//! Leakage drift of a calibrated point.
//!
//! Once a search has found the null, the same offsets are re-measured at a
//! fixed interval to see how far the leakage wanders as the mixer and LO warm.

use std::time::Duration;

use iqcal_core::{Measure, Sample};
use thiserror::Error;
use tracing::{debug, info};

use crate::Pause;

/// Errors raised by [`DriftPlan::new`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DriftPlanError {
    #[error("drift interval must be positive")]
    ZeroInterval,

    #[error("drift duration {duration:?} is shorter than one interval ({interval:?})")]
    TooShort {
        duration: Duration,
        interval: Duration,
    },
}

/// How often and for how long to re-measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftPlan {
    interval: Duration,
    duration: Duration,
}

impl DriftPlan {
    /// # Errors
    ///
    /// Returns an error if `interval` is zero or longer than `duration`.
    pub fn new(interval: Duration, duration: Duration) -> Result<Self, DriftPlanError> {
        if interval.is_zero() {
            return Err(DriftPlanError::ZeroInterval);
        }
        if duration < interval {
            return Err(DriftPlanError::TooShort { duration, interval });
        }
        Ok(Self { interval, duration })
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of readings: `duration / interval`, rounded down.
    #[must_use]
    pub fn readings(&self) -> usize {
        let count = self.duration.as_nanos() / self.interval.as_nanos();
        usize::try_from(count).unwrap_or(usize::MAX)
    }
}

/// One re-measurement, `elapsed` after the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftReading {
    pub elapsed: Duration,
    pub sample: Sample,
}

/// Waits for the LO and mixer to reach operating temperature.
pub fn warm_up<P: Pause>(pause: &mut P, duration: Duration) {
    if duration.is_zero() {
        return;
    }
    info!(?duration, "waiting for warm-up");
    pause.pause(duration);
}

/// Re-measures `point` every `plan.interval()` until `plan.duration()` is covered.
///
/// Restarting averages between readings is the measurement's job; see
/// [`MarkerMeasurement::with_restart_averaging`](crate::MarkerMeasurement::with_restart_averaging).
///
/// # Errors
///
/// Returns the first measurement error unmodified. Readings taken before it
/// are discarded.
pub fn monitor_drift<M, P>(
    measure: &mut M,
    pause: &mut P,
    point: [f64; 2],
    plan: &DriftPlan,
) -> Result<Vec<DriftReading>, M::Error>
where
    M: Measure<2>,
    P: Pause,
{
    info!(
        i = point[0],
        q = point[1],
        interval = ?plan.interval,
        duration = ?plan.duration,
        "measuring drift"
    );

    let mut readings = Vec::new();
    let mut elapsed = Duration::ZERO;
    for index in 0..plan.readings() {
        if index > 0 {
            pause.pause(plan.interval);
            elapsed = elapsed.saturating_add(plan.interval);
        }
        let power = measure.measure(point)?;
        debug!(?elapsed, power, "drift reading");
        readings.push(DriftReading {
            elapsed,
            sample: Sample::new(point[0], point[1], power),
        });
    }
    Ok(readings)
}

/// Spread between the highest and lowest reading, or `None` if there are none.
#[must_use]
pub fn drift_span(readings: &[DriftReading]) -> Option<f64> {
    let powers = readings.iter().map(|reading| reading.sample.power);
    let max = powers.clone().reduce(f64::max)?;
    let min = powers.reduce(f64::min)?;
    Some(max - min)
}
