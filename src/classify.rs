//! Turning a [`ProbeOutcome`] into something a user can read.

use crate::outcome::{ProbeOutcome, ServerMetadata, ServiceFailure, UnreachableReason};
use serde::Serialize;
use std::fmt;

/// Coarse latency buckets shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyTier {
    /// At most 200 ms.
    Normal,
    /// 201 to 600 ms.
    Slow,
    /// More than 600 ms.
    VeryHigh,
}

impl LatencyTier {
    const SLOW_ABOVE_MS: u64 = 200;
    const VERY_HIGH_ABOVE_MS: u64 = 600;

    /// Bucket a latency. The thresholds are exclusive, so 200 ms is still
    /// [`LatencyTier::Normal`] and 600 ms is still [`LatencyTier::Slow`].
    #[must_use]
    pub fn from_latency(latency_ms: u64) -> Self {
        if latency_ms > Self::VERY_HIGH_ABOVE_MS {
            Self::VeryHigh
        } else if latency_ms > Self::SLOW_ABOVE_MS {
            Self::Slow
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for LatencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "Normal ping",
            Self::Slow => "Slow server",
            Self::VeryHigh => "Very high ping",
        })
    }
}

/// The verdict for one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// The server answered; only this variant has a latency.
    Latency {
        /// Measured round trip.
        latency_ms: u64,
        /// Bucket for `latency_ms`.
        tier: LatencyTier,
    },

    /// The server is down or refused us.
    Unreachable {
        /// The specific target-side reason.
        reason: UnreachableReason,
    },

    /// The lookup path failed; the server may well be up.
    ServiceError {
        /// The intermediary failure.
        failure: ServiceFailure,
    },
}

/// A classified probe result, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedOutcome {
    /// The verdict.
    #[serde(flatten)]
    pub classification: Classification,

    /// Auxiliary data carried over from a reachable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ServerMetadata>,
}

impl ClassifiedOutcome {
    /// The latency tier, if the server was reachable.
    #[must_use]
    pub fn tier(&self) -> Option<LatencyTier> {
        match self.classification {
            Classification::Latency { tier, .. } => Some(tier),
            _ => None,
        }
    }

    /// True when the server answered.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        matches!(self.classification, Classification::Latency { .. })
    }
}

/// Classify a probe outcome. Pure, no I/O.
#[must_use]
pub fn classify(outcome: ProbeOutcome) -> ClassifiedOutcome {
    match outcome {
        ProbeOutcome::Reachable {
            latency_ms,
            metadata,
        } => ClassifiedOutcome {
            classification: Classification::Latency {
                latency_ms,
                tier: LatencyTier::from_latency(latency_ms),
            },
            metadata: metadata.filter(|m| !m.is_empty()),
        },
        ProbeOutcome::Unreachable { reason } => ClassifiedOutcome {
            classification: Classification::Unreachable { reason },
            metadata: None,
        },
        ProbeOutcome::ServiceError { failure } => ClassifiedOutcome {
            classification: Classification::ServiceError { failure },
            metadata: None,
        },
    }
}

impl fmt::Display for ClassifiedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classification {
            Classification::Latency { latency_ms, tier } => {
                write!(f, "**{latency_ms} ms**\n{tier}")?;
            }
            Classification::Unreachable { reason } => {
                write!(f, "**Server Down** or unreachable ({reason})")?;
            }
            Classification::ServiceError { failure } => {
                write!(f, "**Status lookup failed**, server state unknown ({failure})")?;
            }
        }

        if let Some(meta) = &self.metadata {
            if let Some(version) = &meta.version {
                write!(f, "\nVersion: {version}")?;
            }
            if let (Some(online), Some(max)) = (meta.players_online, meta.players_max) {
                write!(f, "\nPlayers: {online}/{max}")?;
            }
            if let Some(motd) = &meta.motd {
                write!(f, "\nMOTD: {motd}")?;
            }
        }

        Ok(())
    }
}
