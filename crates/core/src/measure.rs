/// A black-box measurement over `N` real coordinates.
///
/// For mixer calibration `N = 2` and `x = [I, Q]`: the implementation sets the
/// DC offsets, waits for the instrument to settle, and reads back a power in
/// any unit where lower is better (typically dBm).
///
/// Measurements drive hardware, so they take `&mut self` and are neither
/// cached nor reordered by solvers. The number and order of calls is part of
/// each solver's contract.
///
/// Any `FnMut([f64; N]) -> Result<f64, E>` closure is a `Measure<N>`.
pub trait Measure<const N: usize> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Performs one measurement at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the measurement could not be taken.
    fn measure(&mut self, x: [f64; N]) -> Result<f64, Self::Error>;
}

impl<F, E, const N: usize> Measure<N> for F
where
    F: FnMut([f64; N]) -> Result<f64, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn measure(&mut self, x: [f64; N]) -> Result<f64, E> {
        self(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    fn measure_twice<M: Measure<2>>(measure: &mut M) -> Result<[f64; 2], M::Error> {
        Ok([measure.measure([0.0, 0.0])?, measure.measure([0.5, 0.5])?])
    }

    #[test]
    fn closures_are_measurements() {
        let mut calls = Vec::new();
        let mut measure = |[i, q]: [f64; 2]| {
            calls.push([i, q]);
            Ok::<_, Infallible>(i + q)
        };

        let readings = measure_twice(&mut measure).unwrap();

        assert_relative_eq!(readings[0], 0.0);
        assert_relative_eq!(readings[1], 1.0);
        assert_eq!(calls, [[0.0, 0.0], [0.5, 0.5]]);
    }
}
