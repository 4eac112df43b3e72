use iqcal_core::OffsetDomain;
use thiserror::Error;

/// Configuration for the Nelder–Mead solver over `N` coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config<const N: usize> {
    x_abs_tol: f64,
    f_abs_tol: f64,
    max_iters: usize,
    max_evals: usize,
    bounds: Option<[(f64, f64); N]>,
}

/// Errors that can occur when validating a Nelder–Mead solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("x_abs_tol must be finite and non-negative")]
    XAbs,

    #[error("f_abs_tol must be finite and non-negative")]
    FAbs,

    #[error("max_iters must be positive")]
    MaxIters,

    #[error("max_evals must be positive")]
    MaxEvals,

    #[error("bounds must be finite with lower <= upper on every axis")]
    Bounds,
}

impl<const N: usize> Default for Config<N> {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-4, 1e-4, 200 * N.max(1), 200 * N.max(1)).unwrap()
    }
}

impl<const N: usize> Config<N> {
    /// Creates a new unbounded config.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, or if a
    /// limit is zero.
    pub fn new(
        x_abs_tol: f64,
        f_abs_tol: f64,
        max_iters: usize,
        max_evals: usize,
    ) -> Result<Self, ConfigError> {
        if !x_abs_tol.is_finite() || x_abs_tol < 0.0 {
            return Err(ConfigError::XAbs);
        }
        if !f_abs_tol.is_finite() || f_abs_tol < 0.0 {
            return Err(ConfigError::FAbs);
        }
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if max_evals == 0 {
            return Err(ConfigError::MaxEvals);
        }

        Ok(Self {
            x_abs_tol,
            f_abs_tol,
            max_iters,
            max_evals,
            bounds: None,
        })
    }

    /// Returns a copy of this config that clips every trial point into
    /// `bounds`, given as inclusive `(lower, upper)` pairs per axis.
    ///
    /// # Errors
    ///
    /// Returns an error if any bound is non-finite or reversed.
    pub fn with_bounds(mut self, bounds: [(f64, f64); N]) -> Result<Self, ConfigError> {
        if bounds
            .iter()
            .any(|(lo, hi)| !lo.is_finite() || !hi.is_finite() || lo > hi)
        {
            return Err(ConfigError::Bounds);
        }
        self.bounds = Some(bounds);
        Ok(self)
    }

    /// Returns the absolute tolerance for vertex convergence.
    #[must_use]
    pub fn x_abs_tol(&self) -> f64 {
        self.x_abs_tol
    }

    /// Returns the absolute tolerance for value convergence.
    #[must_use]
    pub fn f_abs_tol(&self) -> f64 {
        self.f_abs_tol
    }

    /// Returns the maximum number of simplex updates.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the measurement budget, checked before each simplex update.
    #[must_use]
    pub fn max_evals(&self) -> usize {
        self.max_evals
    }

    /// Returns the per-axis bounds, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<&[(f64, f64); N]> {
        self.bounds.as_ref()
    }

    /// Clips `x` into the bounds, if any.
    pub(super) fn clip(&self, x: [f64; N]) -> [f64; N] {
        match &self.bounds {
            Some(bounds) => std::array::from_fn(|k| x[k].max(bounds[k].0).min(bounds[k].1)),
            None => x,
        }
    }
}

impl Config<2> {
    /// Returns a copy of this config bounded to `[min, max - step]` on both
    /// the I and Q axes.
    #[must_use]
    pub fn with_domain(mut self, domain: &OffsetDomain) -> Self {
        let axis = (domain.min(), domain.upper());
        self.bounds = Some([axis, axis]);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn default_scales_limits_with_dimension() {
        let config = Config::<2>::default();

        assert_eq!(config.max_iters(), 400);
        assert_eq!(config.max_evals(), 400);
        assert!(config.bounds().is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(Config::<2>::new(-1.0, 1.0, 10, 10), Err(ConfigError::XAbs));
        assert_eq!(Config::<2>::new(1e-4, f64::NAN, 10, 10), Err(ConfigError::FAbs));
        assert_eq!(Config::<2>::new(1e-4, 2.0, 0, 10), Err(ConfigError::MaxIters));
        assert_eq!(Config::<2>::new(1e-4, 2.0, 10, 0), Err(ConfigError::MaxEvals));
        assert_eq!(
            Config::<2>::default().with_bounds([(0.0, 1.0), (1.0, 0.0)]),
            Err(ConfigError::Bounds)
        );
    }

    #[test]
    fn clip_respects_domain_upper_bound() {
        let domain = OffsetDomain::normalized();
        let config = Config::<2>::default().with_domain(&domain);

        let clipped = config.clip([0.9, -0.7]);

        assert_relative_eq!(clipped[0], domain.upper());
        assert_relative_eq!(clipped[1], -0.5);
    }

    #[test]
    fn unbounded_clip_is_identity() {
        let config = Config::<3>::default();
        assert_eq!(config.clip([10.0, -10.0, 0.5]), [10.0, -10.0, 0.5]);
    }
}
