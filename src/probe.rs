//! The probing strategies and the capability they share.
//! See the documentation for [`Probe`] for the contract.

pub mod http;
pub mod raknet;
mod slp;
pub mod tcp;

use crate::{
    config::ProbeConfig,
    endpoint::Endpoint,
    outcome::{ProbeOutcome, UnreachableReason},
};
use async_trait::async_trait;

/// One way of checking whether an endpoint is up and how fast it answers.
///
/// Implementations must not return before they have an outcome, must not
/// panic on anything the network sends them, and must finish within
/// `config.timeout`. Any socket or client they open belongs to the call and
/// is released when the returned future completes or is dropped.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Probe the endpoint once.
    async fn probe(&self, endpoint: &Endpoint, config: &ProbeConfig) -> ProbeOutcome;

    /// The outcome to report when the time budget ran out.
    ///
    /// For direct probes the target did not answer, so this is
    /// [`UnreachableReason::Timeout`].
    fn timeout_outcome(&self) -> ProbeOutcome {
        ProbeOutcome::unreachable(UnreachableReason::Timeout)
    }
}

/// Milliseconds in a duration, saturating instead of truncating.
pub(crate) fn millis(dur: std::time::Duration) -> u64 {
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}
