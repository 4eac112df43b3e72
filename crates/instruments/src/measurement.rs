use std::time::Duration;

use iqcal_core::Measure;
use thiserror::Error;
use tracing::debug;

use crate::{OffsetSink, Pause};

/// Reads the analyzer marker that tracks the tone being minimized.
pub trait MarkerReadout {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the marker amplitude.
    fn marker_power(&mut self) -> Result<f64, Self::Error>;

    /// Moves the marker to the highest peak.
    fn peak_search(&mut self) -> Result<(), Self::Error>;

    /// Discards accumulated averages. A no-op for readouts without averaging.
    fn restart_averaging(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Returns `true` once a fresh reading is available.
    ///
    /// Readouts that cannot report readiness are always settled; pair them
    /// with [`Settle::Fixed`].
    fn is_settled(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// How long to wait between applying a setting and reading the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Wait a fixed duration.
    Fixed(Duration),

    /// Poll [`MarkerReadout::is_settled`] every `poll` until it reports ready,
    /// failing after `timeout`. A zero `poll` checks readiness once.
    UntilReady { poll: Duration, timeout: Duration },
}

impl Default for Settle {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(100))
    }
}

/// Why settling did not produce a reading.
pub(crate) enum Unsettled<E> {
    Readout(E),
    Timeout(Duration),
}

impl Settle {
    /// Pauses that fit in `timeout`, rounded up. A zero `poll` checks once.
    fn polls(poll: Duration, timeout: Duration) -> u128 {
        if poll.is_zero() {
            0
        } else {
            timeout.as_nanos().div_ceil(poll.as_nanos())
        }
    }

    pub(crate) fn wait<R, P>(
        &self,
        readout: &mut R,
        pause: &mut P,
    ) -> Result<(), Unsettled<R::Error>>
    where
        R: MarkerReadout,
        P: Pause,
    {
        match *self {
            Self::Fixed(duration) => {
                pause.pause(duration);
                Ok(())
            }
            Self::UntilReady { poll, timeout } => {
                for _ in 0..Self::polls(poll, timeout) {
                    if readout.is_settled().map_err(Unsettled::Readout)? {
                        return Ok(());
                    }
                    pause.pause(poll);
                }
                if readout.is_settled().map_err(Unsettled::Readout)? {
                    Ok(())
                } else {
                    Err(Unsettled::Timeout(timeout))
                }
            }
        }
    }
}

/// Errors raised by [`MarkerMeasurement`].
///
/// `S` is the offset sink's error and `R` the readout's.
#[derive(Debug, Error)]
pub enum MeasurementError<S, R> {
    #[error("failed to set DC offsets: {0}")]
    Offsets(#[source] S),

    #[error("failed to read marker: {0}")]
    Readout(#[source] R),

    #[error("reading not settled within {timeout:?}")]
    NotSettled { timeout: Duration },
}

/// Measures carrier leakage at an (I, Q) offset pair.
///
/// Each call sets both offsets, settles, optionally restarts averaging and
/// runs a peak search, then reads the marker. Readings are never cached: the
/// same point measured twice drives the hardware twice.
pub struct MarkerMeasurement<S, R, P> {
    sink: S,
    readout: R,
    pause: P,
    settle: Settle,
    peak_search: bool,
    restart_averaging: bool,
}

impl<S: OffsetSink, R: MarkerReadout, P: Pause> MarkerMeasurement<S, R, P> {
    pub fn new(sink: S, readout: R, pause: P, settle: Settle) -> Self {
        Self {
            sink,
            readout,
            pause,
            settle,
            peak_search: false,
            restart_averaging: false,
        }
    }

    /// Runs a marker peak search before every reading.
    #[must_use]
    pub fn with_peak_search(mut self) -> Self {
        self.peak_search = true;
        self
    }

    /// Restarts trace averaging after every offset change.
    #[must_use]
    pub fn with_restart_averaging(mut self) -> Self {
        self.restart_averaging = true;
        self
    }

    /// Returns the sink and readout.
    pub fn into_parts(self) -> (S, R) {
        (self.sink, self.readout)
    }
}

impl<S: OffsetSink, R: MarkerReadout, P: Pause> Measure<2> for MarkerMeasurement<S, R, P> {
    type Error = MeasurementError<S::Error, R::Error>;

    fn measure(&mut self, [i, q]: [f64; 2]) -> Result<f64, Self::Error> {
        self.sink
            .set_offsets(i, q)
            .map_err(MeasurementError::Offsets)?;

        if self.restart_averaging {
            self.readout
                .restart_averaging()
                .map_err(MeasurementError::Readout)?;
        }

        self.settle
            .wait(&mut self.readout, &mut self.pause)
            .map_err(|unsettled| match unsettled {
                Unsettled::Readout(error) => MeasurementError::Readout(error),
                Unsettled::Timeout(timeout) => MeasurementError::NotSettled { timeout },
            })?;

        if self.peak_search {
            self.readout
                .peak_search()
                .map_err(MeasurementError::Readout)?;
        }

        let power = self
            .readout
            .marker_power()
            .map_err(MeasurementError::Readout)?;
        debug!(i, q, power, "marker reading");
        Ok(power)
    }
}
