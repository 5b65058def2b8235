//! Parse, probe once, classify.

use crate::{
    classify::{classify, ClassifiedOutcome},
    config::ProbeConfig,
    endpoint::Endpoint,
    errors::ParseError,
    outcome::ProbeOutcome,
    probe::Probe,
};
use tokio::time::timeout;
use tracing::{info, warn};

/// Probe the endpoint described by `raw` with the strategy in `config`.
///
/// Exactly one network probe is made, or none when `raw` does not parse.
/// There are no retries: a failed attempt is the answer.
///
/// # Errors
/// Returns the [`ParseError`] if `raw` is not a valid endpoint. Probe
/// failures are not errors; they are part of the [`ClassifiedOutcome`].
///
/// # Examples
/// ```no_run
/// use mc_probe::{run_probe, ProbeConfig, Strategy};
///
/// #[tokio::main]
/// async fn main() {
///     let config = ProbeConfig::new(Strategy::NativeUdp);
///
///     match run_probe("play.example.com:19132", &config).await {
///         Ok(outcome) => println!("{outcome}"),
///         Err(err) => println!("{err}"),
///     }
/// }
/// ```
pub async fn run_probe(raw: &str, config: &ProbeConfig) -> Result<ClassifiedOutcome, ParseError> {
    let endpoint = Endpoint::parse(raw)?;
    let probe = config.strategy.build();

    Ok(probe_endpoint(probe.as_ref(), &endpoint, config).await)
}

/// Like [`run_probe`], but with a caller-supplied strategy instead of the
/// one named in `config.strategy`.
///
/// # Errors
/// Returns the [`ParseError`] if `raw` is not a valid endpoint.
pub async fn run_probe_with(
    probe: &dyn Probe,
    raw: &str,
    config: &ProbeConfig,
) -> Result<ClassifiedOutcome, ParseError> {
    let endpoint = Endpoint::parse(raw)?;

    Ok(probe_endpoint(probe, &endpoint, config).await)
}

/// Probe an already parsed endpoint and classify the result.
///
/// The strategy is expected to honor `config.timeout` itself; this enforces
/// it again so a misbehaving strategy cannot hold the caller longer.
pub async fn probe_endpoint(
    probe: &dyn Probe,
    endpoint: &Endpoint,
    config: &ProbeConfig,
) -> ClassifiedOutcome {
    info!(%endpoint, strategy = probe.name(), timeout_ms = config.timeout.as_millis() as u64, "probing");

    let outcome = match timeout(config.timeout, probe.probe(endpoint, config)).await {
        Ok(outcome) => outcome,
        Err(_) => probe.timeout_outcome(),
    };

    match &outcome {
        ProbeOutcome::Reachable { latency_ms, .. } => {
            info!(%endpoint, latency_ms, "reachable");
        }
        ProbeOutcome::Unreachable { reason } => {
            warn!(%endpoint, %reason, "unreachable");
        }
        ProbeOutcome::ServiceError { failure } => {
            warn!(%endpoint, %failure, "status lookup failed");
        }
    }

    classify(outcome)
}
