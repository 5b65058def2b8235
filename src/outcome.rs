//! The result of a single probe, before classification.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{self, ErrorKind},
};

/// What a probe strategy found out about an endpoint.
///
/// Strategies never fail with an error; every failure mode is one of these
/// variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The target answered.
    Reachable {
        /// Measured round trip in milliseconds.
        latency_ms: u64,

        /// Auxiliary display data, when the strategy learned any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ServerMetadata>,
    },

    /// The target itself could not be reached.
    Unreachable {
        /// Why the target was considered unreachable.
        reason: UnreachableReason,
    },

    /// The status-lookup path failed, so nothing is known about the target.
    ServiceError {
        /// What went wrong with the intermediary.
        failure: ServiceFailure,
    },
}

impl ProbeOutcome {
    /// Shorthand for a [`ProbeOutcome::Reachable`] without metadata.
    #[must_use]
    pub fn reachable(latency_ms: u64) -> Self {
        Self::Reachable {
            latency_ms,
            metadata: None,
        }
    }

    /// Shorthand for a [`ProbeOutcome::Unreachable`].
    #[must_use]
    pub fn unreachable(reason: UnreachableReason) -> Self {
        Self::Unreachable { reason }
    }

    /// Shorthand for a [`ProbeOutcome::ServiceError`].
    #[must_use]
    pub fn service_error(failure: ServiceFailure) -> Self {
        Self::ServiceError { failure }
    }

    /// The measured latency, only present when the target was reachable.
    #[must_use]
    pub fn latency_ms(&self) -> Option<u64> {
        match self {
            Self::Reachable { latency_ms, .. } => Some(*latency_ms),
            _ => None,
        }
    }
}

/// Target-side failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// The target host actively refused the connection.
    ConnectionRefused,
    /// The target did not answer within the timeout.
    Timeout,
    /// The target answered with something that is not a valid response.
    ProtocolError,
    /// Any other failure, including name resolution.
    Unknown,
}

impl UnreachableReason {
    /// Map a transport error from a direct probe to a reason.
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => Self::ProtocolError,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionRefused => "connection refused",
            Self::Timeout => "no response before timeout",
            Self::ProtocolError => "invalid response",
            Self::Unknown => "unreachable",
        })
    }
}

/// Failure of an intermediary (status API or the local query transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ServiceFailure {
    /// The intermediary did not answer within the timeout.
    Timeout,
    /// The status API answered with a non-success HTTP status.
    HttpStatus(u16),
    /// The status API answered with a body that could not be understood.
    MalformedPayload(String),
    /// The request could not be made at all.
    Transport(String),
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("status service timed out"),
            Self::HttpStatus(code) => write!(f, "status service returned HTTP {code}"),
            Self::MalformedPayload(why) => write!(f, "status service sent a malformed payload: {why}"),
            Self::Transport(why) => write!(f, "query transport failed: {why}"),
        }
    }
}

/// Display data some strategies can extract alongside the latency.
///
/// None of it takes part in deciding reachability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// Players currently online.
    pub players_online: Option<u32>,
    /// Player limit.
    pub players_max: Option<u32>,
    /// Message of the day, without formatting codes.
    pub motd: Option<String>,
    /// Game version name.
    pub version: Option<String>,
}

impl ServerMetadata {
    /// True when no field was filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{ProbeOutcome, ServiceFailure, UnreachableReason};
    use std::io::{self, ErrorKind};

    #[test]
    fn test_reason_from_io() {
        let cases = [
            (ErrorKind::ConnectionRefused, UnreachableReason::ConnectionRefused),
            (ErrorKind::TimedOut, UnreachableReason::Timeout),
            (ErrorKind::InvalidData, UnreachableReason::ProtocolError),
            (ErrorKind::UnexpectedEof, UnreachableReason::ProtocolError),
            (ErrorKind::ConnectionReset, UnreachableReason::Unknown),
            (ErrorKind::Other, UnreachableReason::Unknown),
        ];

        for (kind, reason) in cases {
            let err = io::Error::new(kind, "test");
            assert_eq!(UnreachableReason::from_io(&err), reason, "{kind:?}");
        }
    }

    #[test]
    fn test_only_reachable_has_latency() {
        assert_eq!(ProbeOutcome::reachable(42).latency_ms(), Some(42));
        assert_eq!(
            ProbeOutcome::unreachable(UnreachableReason::Timeout).latency_ms(),
            None
        );
        assert_eq!(
            ProbeOutcome::service_error(ServiceFailure::HttpStatus(503)).latency_ms(),
            None
        );
    }

    #[test]
    fn test_service_failure_messages() {
        let transport = ServiceFailure::Transport("bind failed".into()).to_string();
        assert_eq!(transport, "query transport failed: bind failed");
        assert!(!transport.contains("status"));

        assert_eq!(
            ServiceFailure::HttpStatus(503).to_string(),
            "status service returned HTTP 503"
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(ProbeOutcome::unreachable(
            UnreachableReason::ConnectionRefused,
        ))
        .unwrap();
        assert_eq!(json["status"], "unreachable");
        assert_eq!(json["reason"], "connection_refused");

        let json =
            serde_json::to_value(ProbeOutcome::service_error(ServiceFailure::HttpStatus(503)))
                .unwrap();
        assert_eq!(json["failure"]["kind"], "http_status");
        assert_eq!(json["failure"]["detail"], 503);
    }
}
