//! Subcommands that talk to bench instruments over raw SCPI sockets.

use anyhow::{Context, Result};
use iqcal_instruments::{
    AnritsuGenerator, DdsGenerator, SignalGenerator, SpectrumAnalyzer, TcpTransport, ThreadPause,
    Transport,
};
use tracing::info;

use crate::settings::{AnalyzerSettings, GeneratorKind, GeneratorSettings};

/// LO changes requested on the command line. Unset fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoRequest {
    pub frequency_mhz: Option<f64>,
    pub power_dbm: Option<f64>,
    pub output: Option<bool>,
}

/// Configures the analyzer and reads marker 1, in dBm.
///
/// # Errors
///
/// Returns an error if the analyzer cannot be reached or answers unexpectedly.
pub fn marker(settings: &AnalyzerSettings, peak_search: bool) -> Result<f64> {
    let transport = TcpTransport::connect(
        (settings.address.as_str(), settings.port),
        settings.timeout(),
    )
    .with_context(|| format!("failed to connect to analyzer at {}", settings.address))?;

    read_marker(transport, settings, peak_search)
}

fn read_marker<T: Transport>(
    transport: T,
    settings: &AnalyzerSettings,
    peak_search: bool,
) -> Result<f64> {
    let mut analyzer = SpectrumAnalyzer::open(transport, ThreadPause, settings.options())?;
    let identity = analyzer.identify()?;
    info!(%identity, "analyzer connected");

    analyzer.configure(&settings.sweep())?;
    analyzer.set_averaging(settings.averaging())?;
    if peak_search {
        analyzer.peak_search()?;
    } else {
        analyzer.set_marker_mhz(settings.center_mhz)?;
    }

    let power = analyzer.marker_power()?;
    info!(power, "marker reading");
    Ok(power)
}

/// Applies `request` to the configured LO generator.
///
/// # Errors
///
/// Returns an error if the generator cannot be reached or a command fails.
pub fn lo(settings: &GeneratorSettings, request: LoRequest) -> Result<()> {
    let transport = TcpTransport::connect(
        (settings.address.as_str(), settings.port),
        settings.timeout(),
    )
    .with_context(|| format!("failed to connect to generator at {}", settings.address))?;

    match settings.kind {
        GeneratorKind::Anritsu => apply(&mut AnritsuGenerator::new(transport, ThreadPause), request),
        GeneratorKind::Dds => apply(
            &mut DdsGenerator::new(transport, ThreadPause, settings.channel),
            request,
        ),
    }
}

fn apply<G: SignalGenerator>(generator: &mut G, request: LoRequest) -> Result<()> {
    if let Some(mhz) = request.frequency_mhz {
        generator.set_frequency_mhz(mhz)?;
    }
    if let Some(dbm) = request.power_dbm {
        generator.set_power_dbm(dbm)?;
    }
    if let Some(on) = request.output {
        generator.set_output(on)?;
    }
    info!(?request, "LO configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, convert::Infallible};

    use approx::assert_relative_eq;
    use iqcal_instruments::TransportError;

    use super::*;

    /// Answers queries from a script and records every line sent.
    #[derive(Default)]
    struct Script {
        sent: Vec<String>,
        responses: VecDeque<&'static str>,
    }

    impl Transport for Script {
        fn write(&mut self, command: &str) -> Result<(), TransportError> {
            self.sent.push(command.to_owned());
            Ok(())
        }

        fn query(&mut self, command: &str) -> Result<String, TransportError> {
            self.sent.push(command.to_owned());
            self.responses
                .pop_front()
                .map(str::to_owned)
                .ok_or(TransportError::Closed)
        }
    }

    #[test]
    fn marker_reads_at_configured_center() {
        let mut script = Script {
            responses: ["Keysight,N9010A", "-72.5"].into(),
            ..Script::default()
        };
        let settings = AnalyzerSettings {
            settle_ms: 0,
            ..AnalyzerSettings::default()
        };

        let power = read_marker(&mut script, &settings, false).unwrap();

        assert_relative_eq!(power, -72.5);
        assert!(script.sent.iter().any(|c| c.starts_with(":CALC:MARK1:X")));
        assert!(!script.sent.iter().any(|c| c.contains("MAX")));
    }

    #[test]
    fn missing_response_is_an_error() {
        let mut script = Script::default();
        let settings = AnalyzerSettings {
            settle_ms: 0,
            ..AnalyzerSettings::default()
        };

        assert!(read_marker(&mut script, &settings, true).is_err());
    }

    /// Records requests without any transport.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl SignalGenerator for Recorder {
        type Error = Infallible;

        fn set_frequency_mhz(&mut self, mhz: f64) -> Result<(), Infallible> {
            self.0.push(format!("freq {mhz}"));
            Ok(())
        }

        fn set_power_dbm(&mut self, dbm: f64) -> Result<(), Infallible> {
            self.0.push(format!("power {dbm}"));
            Ok(())
        }

        fn set_output(&mut self, on: bool) -> Result<(), Infallible> {
            self.0.push(format!("output {on}"));
            Ok(())
        }
    }

    #[test]
    fn lo_request_only_touches_given_fields() {
        let mut generator = Recorder::default();
        let request = LoRequest {
            power_dbm: Some(13.0),
            output: Some(true),
            ..LoRequest::default()
        };

        apply(&mut generator, request).unwrap();

        assert_eq!(generator.0, ["power 13", "output true"]);
    }
}
