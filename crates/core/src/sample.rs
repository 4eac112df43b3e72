/// A single measured point: DC offsets `(i, q)` and the power read back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub i: f64,
    pub q: f64,
    pub power: f64,
}

impl Sample {
    #[must_use]
    pub fn new(i: f64, q: f64, power: f64) -> Self {
        Self { i, q, power }
    }

    /// Returns the offsets as `[i, q]`.
    #[must_use]
    pub fn point(&self) -> [f64; 2] {
        [self.i, self.q]
    }
}
