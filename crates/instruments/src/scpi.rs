//! Line-oriented SCPI transport.
//!
//! Instruments here are driven by plain text commands, one per line. A
//! [`Transport`] only moves those lines; drivers decide what to send. VISA or
//! GPIB sessions can implement the same trait outside this crate.

use std::{
    io::{self, BufRead, BufReader, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use thiserror::Error;
use tracing::debug;

/// Errors raised while talking to an instrument.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("instrument I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("instrument closed the connection")]
    Closed,

    #[error("no address resolved for {0}")]
    Unresolved(String),
}

/// Sends SCPI commands and reads their responses.
pub trait Transport {
    /// Sends a command that produces no response.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be delivered.
    fn write(&mut self, command: &str) -> Result<(), TransportError>;

    /// Sends a query and returns its response line without the terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be delivered or no response arrives.
    fn query(&mut self, command: &str) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        (**self).query(command)
    }
}

/// A raw SCPI socket, as exposed by most LAN instruments on port 5025.
///
/// Commands are newline terminated. Reads and writes time out after the
/// duration given to [`connect`](TcpTransport::connect).
#[derive(Debug)]
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpTransport {
    /// Default port for raw SCPI sockets.
    pub const DEFAULT_PORT: u16 = 5025;

    /// Connects to an instrument.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or the connection
    /// cannot be established within `timeout`.
    pub fn connect(
        addr: impl ToSocketAddrs + std::fmt::Debug,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let resolved = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| TransportError::Unresolved(format!("{addr:?}")))?;

        debug!("Connecting to SCPI socket at {}", resolved);
        let stream = TcpStream::connect_timeout(&resolved, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        })
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        debug!("SCPI write: {}", command);
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.write(command)?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(TransportError::Closed);
        }
        let response = line.trim_end_matches(['\r', '\n']).to_owned();
        debug!("SCPI response: {}", response);
        Ok(response)
    }
}
