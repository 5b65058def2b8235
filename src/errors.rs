//! All the errors defined by this crate.

use std::io::{self, ErrorKind};
use thiserror::Error;

/// An error in the user-supplied endpoint text.
///
/// These are input errors, so their messages carry a usage hint that can be
/// shown to whoever typed the command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input did not split into exactly a host and a port.
    #[error("expected a host and a port, use `ping host:port` or `ping host port`")]
    WrongArity,

    /// The port token was not an integer between 1 and 65535.
    #[error("invalid port `{0}`, expected a number between 1 and 65535")]
    InvalidPort(String),
}

/// An error from the RakNet unconnected ping exchange.
#[derive(Error, Debug)]
pub enum RakNetProtocolError {
    /// The datagram was shorter than the fixed part of an unconnected pong.
    #[error("truncated pong")]
    Truncated,

    /// The first byte was not the unconnected pong id.
    #[error("unexpected packet id {0:#04x}")]
    UnexpectedPacketId(u8),

    /// The offline message magic did not match.
    #[error("invalid offline magic")]
    InvalidMagic,

    /// The server echoed a different ping timestamp than the one sent.
    #[error("ping timestamp mismatch")]
    TimestampMismatch,

    /// The advertisement string was not valid UTF-8.
    #[error("invalid advertisement string")]
    InvalidAdvertisement,
}

impl From<RakNetProtocolError> for io::Error {
    fn from(err: RakNetProtocolError) -> Self {
        io::Error::new(ErrorKind::InvalidData, err)
    }
}

/// An error from the Java Server List Ping exchange used for TCP echo.
#[derive(Error, Debug)]
pub enum SlpProtocolError {
    /// VarInt data was longer than five bytes.
    #[error("invalid varint data")]
    InvalidVarInt,

    /// A length prefix was negative or absurdly large.
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    /// Recieved a packet id other than the one expected.
    #[error("unexpected packet id {0}")]
    UnexpectedPacketId(i32),

    /// The pong payload did not match the ping payload.
    #[error("pong payload mismatch")]
    PayloadMismatch,

    /// The status response JSON could not be parsed.
    #[error("invalid status response")]
    InvalidStatusResponse,
}

impl From<SlpProtocolError> for io::Error {
    fn from(err: SlpProtocolError) -> Self {
        io::Error::new(ErrorKind::InvalidData, err)
    }
}

/// Build the error returned when a response does not arrive in time.
pub(crate) fn timeout_err<T>() -> io::Result<T> {
    Err(io::Error::new(ErrorKind::TimedOut, "response not recieved within timeout"))
}
