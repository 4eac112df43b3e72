/// Applies I/Q DC offsets to the mixer's baseband inputs.
///
/// This is the boundary to the pulse-sequencer SDK that owns the DAC outputs.
/// Offsets arrive in normalized units, the same coordinates the solvers search.
pub trait OffsetSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sets the I and Q offsets. Returns once the hardware accepted both.
    fn set_offsets(&mut self, i: f64, q: f64) -> Result<(), Self::Error>;
}

impl<F, E> OffsetSink for F
where
    F: FnMut(f64, f64) -> Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn set_offsets(&mut self, i: f64, q: f64) -> Result<(), E> {
        self(i, q)
    }
}
