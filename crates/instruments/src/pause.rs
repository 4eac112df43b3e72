use std::time::Duration;

/// Blocks the calling thread for a settle delay.
///
/// Drivers and measurement adapters never sleep directly. Tests substitute a
/// recording implementation so instrument timing can be checked without
/// waiting.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Pauses with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
