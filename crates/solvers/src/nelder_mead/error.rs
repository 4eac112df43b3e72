/// Errors that can occur during a Nelder–Mead search.
///
/// `E` is the measurement's error type, returned unmodified.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("measurement failed: {0}")]
    Measure(#[source] E),
}
