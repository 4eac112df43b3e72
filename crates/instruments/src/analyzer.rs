use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::{MarkerReadout, Pause, ThreadPause, Transport, TransportError};

/// Errors raised by the spectrum analyzer driver.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected response to {command}: {response:?}")]
    Parse {
        command: &'static str,
        response: String,
    },

    #[error("averaging count must be positive")]
    AveragingCount,
}

/// Options applied when a session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Lets the analyzer choose sweep type by speed (`SWE:TYPE:AUTO:RUL SPE`).
    pub auto_sweep_speed: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            auto_sweep_speed: true,
        }
    }
}

/// Span, resolution bandwidth, and sweep size around a centre frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub center_mhz: f64,
    pub span_hz: f64,
    pub rbw_hz: f64,
    pub points: u32,

    /// Wait after reconfiguring, before the first reading is trusted.
    pub settle: Duration,
}

impl Sweep {
    /// A 1 MHz span around a single tone, 10 kHz RBW.
    #[must_use]
    pub fn tone(center_mhz: f64) -> Self {
        Self {
            center_mhz,
            span_hz: 1e6,
            rbw_hz: 10e3,
            points: 101,
            settle: Duration::from_secs(1),
        }
    }
}

/// Trace averaging mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Averaging {
    /// Clear/write: every sweep replaces the trace.
    Off,

    /// Average over this many sweeps.
    Count(u32),
}

/// One point of a trace readout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub frequency_hz: f64,
    pub power_dbm: f64,
}

/// A swept spectrum analyzer using the Keysight X-series (N9010A) command set.
///
/// Marker 1 tracks the tone of interest. Readings are taken in dBm.
pub struct SpectrumAnalyzer<T, P = ThreadPause> {
    transport: T,
    pause: P,
}

impl<T: Transport, P: Pause> SpectrumAnalyzer<T, P> {
    /// Opens a session: ASCII trace data, marker 1 on.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup command fails.
    pub fn open(transport: T, pause: P, options: AnalyzerOptions) -> Result<Self, AnalyzerError> {
        let mut analyzer = Self { transport, pause };
        analyzer.transport.write(":FORM:DATA ASC,8")?;
        analyzer.transport.write(":CALC:MARK1:STAT ON")?;
        if options.auto_sweep_speed {
            analyzer.transport.write("SWE:TYPE:AUTO:RUL SPE")?;
        }
        Ok(analyzer)
    }

    /// Returns the `*IDN?` identification string.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn identify(&mut self) -> Result<String, AnalyzerError> {
        Ok(self.transport.query("*IDN?")?)
    }

    /// Applies a sweep configuration and waits for it to settle.
    ///
    /// # Errors
    ///
    /// Returns an error if any command fails.
    pub fn configure(&mut self, sweep: &Sweep) -> Result<(), AnalyzerError> {
        debug!(
            "Configuring analyzer: {} MHz, span {} Hz, RBW {} Hz, {} points",
            sweep.center_mhz, sweep.span_hz, sweep.rbw_hz, sweep.points
        );
        self.transport
            .write(&format!(":FREQ:CENTER {:.6}E6", sweep.center_mhz))?;
        self.transport
            .write(&format!(":FREQ:SPAN {:.6}", sweep.span_hz))?;
        self.transport.write(&format!(":BAND {:.6}", sweep.rbw_hz))?;
        self.transport.write(&format!(":SWE:POIN {}", sweep.points))?;
        self.pause.pause(sweep.settle);
        Ok(())
    }

    /// Switches trace averaging on with a sweep count, or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the count is zero or a command fails.
    pub fn set_averaging(&mut self, averaging: Averaging) -> Result<(), AnalyzerError> {
        match averaging {
            Averaging::Off => self.transport.write("TRAC:TYPE WRIT")?,
            Averaging::Count(0) => return Err(AnalyzerError::AveragingCount),
            Averaging::Count(count) => {
                self.transport.write(":TRAC:TYPE AVER")?;
                self.transport.write(&format!("AVER:COUN {count}"))?;
            }
        }
        Ok(())
    }

    /// Restarts trace averaging so stale sweeps do not bleed into the next reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn restart_averaging(&mut self) -> Result<(), AnalyzerError> {
        Ok(self.transport.write(":TRAC:TYPE AVER")?)
    }

    /// Moves marker 1 to the highest peak.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn peak_search(&mut self) -> Result<(), AnalyzerError> {
        Ok(self.transport.write(":CALC:MARK1:MAX;")?)
    }

    /// Places marker 1 at a frequency.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn set_marker_mhz(&mut self, mhz: f64) -> Result<(), AnalyzerError> {
        Ok(self.transport.write(&format!(":CALC:MARK1:X {mhz:.6}E6"))?)
    }

    /// Reads the marker amplitude in dBm.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the response is not a number.
    pub fn marker_power(&mut self) -> Result<f64, AnalyzerError> {
        const COMMAND: &str = ":CALC:MARK:Y?;";
        let response = self.transport.query(COMMAND)?;
        parse_number(COMMAND, &response)
    }

    /// Reads the current trace as frequency/power pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the response is not an even list
    /// of numbers.
    pub fn trace(&mut self) -> Result<Vec<TracePoint>, AnalyzerError> {
        const COMMAND: &str = "CALC:DATA?";
        let response = self.transport.query(COMMAND)?;
        parse_trace(COMMAND, &response)
    }

    /// Returns `true` once all pending operations have completed (`*OPC?`).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the response is not `0` or `1`.
    pub fn operation_complete(&mut self) -> Result<bool, AnalyzerError> {
        const COMMAND: &str = "*OPC?";
        let response = self.transport.query(COMMAND)?;
        match response.trim() {
            "1" | "+1" => Ok(true),
            "0" | "+0" => Ok(false),
            _ => Err(AnalyzerError::Parse {
                command: COMMAND,
                response: response.clone(),
            }),
        }
    }

    /// Returns the transport, ending the session.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Transport, P: Pause> MarkerReadout for SpectrumAnalyzer<T, P> {
    type Error = AnalyzerError;

    fn marker_power(&mut self) -> Result<f64, AnalyzerError> {
        SpectrumAnalyzer::marker_power(self)
    }

    fn peak_search(&mut self) -> Result<(), AnalyzerError> {
        SpectrumAnalyzer::peak_search(self)
    }

    fn restart_averaging(&mut self) -> Result<(), AnalyzerError> {
        SpectrumAnalyzer::restart_averaging(self)
    }

    fn is_settled(&mut self) -> Result<bool, AnalyzerError> {
        self.operation_complete()
    }
}

fn parse_number(command: &'static str, response: &str) -> Result<f64, AnalyzerError> {
    response
        .trim()
        .parse()
        .map_err(|_| AnalyzerError::Parse {
            command,
            response: response.to_owned(),
        })
}

fn parse_trace(command: &'static str, response: &str) -> Result<Vec<TracePoint>, AnalyzerError> {
    let parse_error = || AnalyzerError::Parse {
        command,
        response: response.to_owned(),
    };

    let values = response
        .split(',')
        .map(|field| field.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| parse_error())?;

    if values.len() % 2 != 0 {
        return Err(parse_error());
    }

    Ok(values
        .chunks_exact(2)
        .map(|pair| TracePoint {
            frequency_hz: pair[0],
            power_dbm: pair[1],
        })
        .collect())
}
