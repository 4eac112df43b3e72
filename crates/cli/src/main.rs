//! `iqcal`: IQ mixer LO-leakage calibration from the command line.
//!
//! ```text
//! iqcal simulate --strategy nelder-mead        # calibrate a simulated mixer
//! iqcal --config bench.toml marker --peak      # read the analyzer marker
//! iqcal --config bench.toml lo --freq 6000 --power 13 --on
//! ```

mod hardware;
mod logging;
mod settings;
mod simulate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iqcal_instruments::ThreadPause;

use crate::{
    hardware::LoRequest,
    logging::LogLevel,
    settings::{Settings, Strategy},
};

#[derive(Parser, Debug)]
#[command(name = "iqcal", version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Every section is optional.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level, overriding the settings file. `RUST_LOG` takes precedence.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate DC offsets against a simulated leaky mixer.
    Simulate {
        /// Solver to run, overriding the settings file.
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Noise seed, overriding the settings file.
        #[arg(long)]
        seed: Option<u64>,

        /// Show the scans in a window when the run finishes.
        #[arg(long)]
        plot: bool,

        /// Re-measure the result over time, as set in the `[drift]` section.
        #[arg(long)]
        drift: bool,
    },

    /// Configure the spectrum analyzer and print the marker reading in dBm.
    Marker {
        /// Move the marker to the highest peak instead of the centre frequency.
        #[arg(long)]
        peak: bool,
    },

    /// Configure the LO signal generator.
    Lo {
        /// Output frequency in MHz.
        #[arg(long = "freq", value_name = "MHZ")]
        frequency_mhz: Option<f64>,

        /// Output level in dBm.
        #[arg(long = "power", value_name = "DBM", allow_negative_numbers = true)]
        power_dbm: Option<f64>,

        /// Switch the RF output on.
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Switch the RF output off.
        #[arg(long)]
        off: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
        settings.logging.filter = None;
    }
    logging::init(&settings.logging)?;

    match cli.command {
        Command::Simulate {
            strategy,
            seed,
            plot,
            drift,
        } => {
            if let Some(strategy) = strategy {
                settings.strategy = strategy;
            }
            if seed.is_some() {
                settings.simulation.seed = seed;
            }
            let outcome = simulate::run(&settings, plot, drift, &mut ThreadPause)?;
            println!(
                "{} i={:.6} q={:.6} power={:.2}",
                outcome.status, outcome.i, outcome.q, outcome.power
            );
            for reading in &outcome.drift {
                println!(
                    "{:.3} {:.2}",
                    reading.elapsed.as_secs_f64(),
                    reading.sample.power
                );
            }
        }
        Command::Marker { peak } => {
            let power = hardware::marker(&settings.analyzer, peak)?;
            println!("{power:.2}");
        }
        Command::Lo {
            frequency_mhz,
            power_dbm,
            on,
            off,
        } => {
            let output = match (on, off) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let request = LoRequest {
                frequency_mhz,
                power_dbm,
                output,
            };
            hardware::lo(&settings.generator, request)?;
        }
    }

    Ok(())
}
