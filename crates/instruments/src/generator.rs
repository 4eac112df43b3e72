use std::time::Duration;

use tracing::debug;

use crate::{Pause, ThreadPause, Transport, TransportError};

/// Settle time after every generator command.
const COMMAND_SETTLE: Duration = Duration::from_millis(100);

/// A CW source driving the mixer's local oscillator port.
pub trait SignalGenerator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sets the output frequency in MHz.
    fn set_frequency_mhz(&mut self, mhz: f64) -> Result<(), Self::Error>;

    /// Sets the output level in dBm.
    fn set_power_dbm(&mut self, dbm: f64) -> Result<(), Self::Error>;

    /// Switches the RF output on or off.
    fn set_output(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// Anritsu MG369x-style synthesizer (`F1`, `L1`, `RF` commands).
pub struct AnritsuGenerator<T, P = ThreadPause> {
    transport: T,
    pause: P,
}

impl<T: Transport, P: Pause> AnritsuGenerator<T, P> {
    pub fn new(transport: T, pause: P) -> Self {
        Self { transport, pause }
    }

    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        self.transport.write(command)?;
        self.pause.pause(COMMAND_SETTLE);
        Ok(())
    }
}

impl<T: Transport, P: Pause> SignalGenerator for AnritsuGenerator<T, P> {
    type Error = TransportError;

    fn set_frequency_mhz(&mut self, mhz: f64) -> Result<(), TransportError> {
        debug!("Setting LO frequency to {} MHz", mhz);
        self.send(&format!("F1 {mhz:.6}MH"))
    }

    fn set_power_dbm(&mut self, dbm: f64) -> Result<(), TransportError> {
        debug!("Setting LO power to {} dBm", dbm);
        self.send(&format!("L1 {dbm:.6}DM"))
    }

    fn set_output(&mut self, on: bool) -> Result<(), TransportError> {
        debug!("Setting LO output {}", if on { "on" } else { "off" });
        self.send(if on { "RF 1" } else { "RF 0" })
    }
}

/// One DDS channel of a Keysight M9347A-style source.
pub struct DdsGenerator<T, P = ThreadPause> {
    transport: T,
    pause: P,
    channel: u8,
}

impl<T: Transport, P: Pause> DdsGenerator<T, P> {
    pub fn new(transport: T, pause: P, channel: u8) -> Self {
        Self {
            transport,
            pause,
            channel,
        }
    }

    #[must_use]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    fn send(&mut self, command: &str) -> Result<(), TransportError> {
        self.transport.write(command)?;
        self.pause.pause(COMMAND_SETTLE);
        Ok(())
    }
}

impl<T: Transport, P: Pause> SignalGenerator for DdsGenerator<T, P> {
    type Error = TransportError;

    fn set_frequency_mhz(&mut self, mhz: f64) -> Result<(), TransportError> {
        debug!("Setting DDS{} frequency to {} MHz", self.channel, mhz);
        let command = format!(":DDS{}:FREQ {mhz:.6}e6", self.channel);
        self.send(&command)
    }

    fn set_power_dbm(&mut self, dbm: f64) -> Result<(), TransportError> {
        debug!("Setting DDS{} power to {} dBm", self.channel, dbm);
        let command = format!(":DDS{}:POW {dbm:.6}", self.channel);
        self.send(&command)
    }

    fn set_output(&mut self, on: bool) -> Result<(), TransportError> {
        let command = format!(":DDS{}:OUTP {}", self.channel, u8::from(on));
        self.send(&command)
    }
}
