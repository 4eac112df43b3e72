use thiserror::Error;

/// The legal interval `[min, max)` of a normalized DAC coordinate.
///
/// The upper bound is exclusive: the largest value the hardware accepts is
/// `max - step`, where `step` is the fixed-point resolution of the output.
/// The canonical domain is `[-0.5, 0.5)` with a 16-bit step of `2⁻¹⁶`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetDomain {
    min: f64,
    max: f64,
    step: f64,
}

/// Errors that can occur when constructing an [`OffsetDomain`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain bounds must be finite with min < max")]
    Bounds,

    #[error("step must be finite, positive, and smaller than the domain width")]
    Step,
}

impl OffsetDomain {
    /// Resolution of a 16-bit fixed-point output: `2⁻¹⁶`.
    pub const DEFAULT_STEP: f64 = 1.0 / 65_536.0;

    /// Creates a validated domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are not finite and ordered, or if `step`
    /// is not a positive value smaller than `max - min`.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, DomainError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(DomainError::Bounds);
        }
        if !step.is_finite() || step <= 0.0 || step >= max - min {
            return Err(DomainError::Step);
        }

        Ok(Self { min, max, step })
    }

    /// The canonical `[-0.5, 0.5)` domain with a `2⁻¹⁶` step.
    #[must_use]
    pub fn normalized() -> Self {
        Self {
            min: -0.5,
            max: 0.5,
            step: Self::DEFAULT_STEP,
        }
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the exclusive upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns the hardware resolution.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Returns the largest value that may be issued: `max - step`.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.max - self.step
    }

    /// Returns true if `value` lies in `[min, max)`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    /// Clamps `value` into `[min, upper()]`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.upper())
    }
}

impl Default for OffsetDomain {
    fn default() -> Self {
        Self::normalized()
    }
}
