use std::{
    io,
    path::PathBuf,
    process::{Command, ExitStatus},
};

use thiserror::Error;
use tracing::debug;

/// Errors raised by [`LdaAttenuator`].
#[derive(Debug, Error)]
pub enum AttenuatorError {
    #[error("attenuation must be finite and non-negative, got {0} dB")]
    Invalid(f64),

    #[error("failed to run the attenuator program: {0}")]
    Spawn(#[source] io::Error),

    #[error("attenuator program exited with {0}")]
    Failed(ExitStatus),
}

/// A LabBrick LDA digital attenuator, driven through the vendor's command-line
/// test program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdaAttenuator {
    program: PathBuf,
    device: u32,
}

impl LdaAttenuator {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, device: u32) -> Self {
        Self {
            program: program.into(),
            device,
        }
    }

    /// The invocation that sets channel 1 of the device to `db`.
    #[must_use]
    pub fn command(&self, db: f64) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-d")
            .arg(self.device.to_string())
            .args(["1", "-b", "-a"])
            .arg(format!("{db:.6}"));
        command
    }

    /// Sets the attenuation and waits for the program to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if `db` is negative or non-finite, or the program
    /// cannot be run or exits unsuccessfully.
    pub fn set_attenuation(&self, db: f64) -> Result<(), AttenuatorError> {
        if !db.is_finite() || db < 0.0 {
            return Err(AttenuatorError::Invalid(db));
        }
        debug!(device = self.device, db, "setting attenuation");
        let status = self.command(db).status().map_err(AttenuatorError::Spawn)?;
        if status.success() {
            Ok(())
        } else {
            Err(AttenuatorError::Failed(status))
        }
    }
}
