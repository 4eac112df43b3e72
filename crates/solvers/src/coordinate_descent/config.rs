use iqcal_core::OffsetDomain;
use thiserror::Error;

/// Configuration for the coordinate-descent solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    initial_range: f64,
    points_per_scan: usize,
    stop_threshold: f64,
    min_range: f64,
    domain: OffsetDomain,
}

/// Errors that can occur when validating a coordinate-descent config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("initial_range must be finite and positive")]
    InitialRange,

    #[error("min_range must be finite and positive")]
    MinRange,

    #[error("points_per_scan must be at least 2")]
    PointsPerScan,

    #[error("stop_threshold must not be NaN")]
    StopThreshold,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(0.8, 16, -90.0, 16.0 / 65_536.0).unwrap()
    }
}

impl Config {
    /// Creates a new config over the normalized `[-0.5, 0.5)` domain.
    ///
    /// - `initial_range`: full width of the first scan window
    /// - `points_per_scan`: evenly spaced measurements per 1D scan
    /// - `stop_threshold`: stop once a reading is at or below this value
    /// - `min_range`: stop once the halved window is narrower than this
    ///
    /// # Errors
    ///
    /// Returns an error if a range is non-positive or non-finite, if fewer
    /// than two points per scan are requested, or if the threshold is NaN.
    pub fn new(
        initial_range: f64,
        points_per_scan: usize,
        stop_threshold: f64,
        min_range: f64,
    ) -> Result<Self, ConfigError> {
        if !initial_range.is_finite() || initial_range <= 0.0 {
            return Err(ConfigError::InitialRange);
        }
        if !min_range.is_finite() || min_range <= 0.0 {
            return Err(ConfigError::MinRange);
        }
        if points_per_scan < 2 {
            return Err(ConfigError::PointsPerScan);
        }
        if stop_threshold.is_nan() {
            return Err(ConfigError::StopThreshold);
        }

        Ok(Self {
            initial_range,
            points_per_scan,
            stop_threshold,
            min_range,
            domain: OffsetDomain::normalized(),
        })
    }

    /// Returns a copy of this config that searches within `domain`.
    #[must_use]
    pub fn with_domain(mut self, domain: OffsetDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Returns the width of the first scan window.
    #[must_use]
    pub fn initial_range(&self) -> f64 {
        self.initial_range
    }

    /// Returns the number of measurements per 1D scan.
    #[must_use]
    pub fn points_per_scan(&self) -> usize {
        self.points_per_scan
    }

    /// Returns the reading at or below which the search stops.
    #[must_use]
    pub fn stop_threshold(&self) -> f64 {
        self.stop_threshold
    }

    /// Returns the narrowest window that is still scanned.
    #[must_use]
    pub fn min_range(&self) -> f64 {
        self.min_range
    }

    /// Returns the domain candidates are clamped to.
    #[must_use]
    pub fn domain(&self) -> &OffsetDomain {
        &self.domain
    }

    /// Returns the number of iterations run when the threshold is never met.
    ///
    /// This is `floor(log2(initial_range / min_range)) + 1`, and at least one.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        let mut iters = 1;
        let mut range = self.initial_range * 0.5;
        while range >= self.min_range {
            iters += 1;
            range *= 0.5;
        }
        iters
    }

    /// Returns the number of measurements run when the threshold is never met.
    #[must_use]
    pub fn max_evaluations(&self) -> usize {
        self.max_iters() * 2 * self.points_per_scan
    }
}
