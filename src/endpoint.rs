//! Parsing of the `host:port` / `host port` text typed by users.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A server to probe.
///
/// The host is kept as typed; it is not resolved until a probe runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse free-form user input into an [`Endpoint`].
    ///
    /// Both `host:port` and `host port` are accepted: every `:` is treated as
    /// whitespace before splitting.
    ///
    /// # Errors
    /// Returns [`ParseError::WrongArity`] unless the input has exactly two
    /// tokens, and [`ParseError::InvalidPort`] if the second token is not an
    /// integer in `1..=65535`.
    ///
    /// # Examples
    /// ```
    /// use mc_probe::Endpoint;
    ///
    /// let a = Endpoint::parse("play.example.com:19132").unwrap();
    /// let b = Endpoint::parse("play.example.com 19132").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let normalized = raw.replace(':', " ");
        let mut tokens = normalized.split_whitespace();

        let (Some(host), Some(port), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(ParseError::WrongArity);
        };

        let port = match port.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(ParseError::InvalidPort(port.to_string())),
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// The hostname or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, never 0.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Endpoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
