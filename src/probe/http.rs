//! Lookup through a third-party status-aggregation API.
//!
//! The service pings the server on our behalf, so failures of the service
//! itself are reported as [`ProbeOutcome::ServiceError`] rather than as the
//! target being down.

use super::Probe;
use crate::{
    config::{ProbeConfig, StatusApiConfig},
    endpoint::Endpoint,
    outcome::{ProbeOutcome, ServerMetadata, ServiceFailure, UnreachableReason},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

/// The part of the status API's JSON we rely on.
///
/// Only `online` is required; the rest is only present for online servers.
#[derive(Debug, Deserialize)]
pub struct StatusApiResponse {
    /// Whether the service could reach the server.
    pub online: bool,
    /// Round trip from the service to the server, in milliseconds.
    pub round_trip_latency: Option<f64>,
    /// Player counts.
    pub players: Option<StatusPlayers>,
    /// Message of the day.
    pub motd: Option<StatusMotd>,
    /// Version information.
    pub version: Option<StatusVersion>,
}

/// Player counts as reported by the status API.
#[derive(Debug, Deserialize)]
pub struct StatusPlayers {
    /// Players online.
    pub online: Option<u32>,
    /// Player limit.
    pub max: Option<u32>,
}

/// Message of the day as reported by the status API.
#[derive(Debug, Deserialize)]
pub struct StatusMotd {
    /// The MOTD with formatting codes stripped.
    pub clean: Option<String>,
}

/// Version as reported by the status API.
#[derive(Debug, Deserialize)]
pub struct StatusVersion {
    /// Human readable version name.
    pub name: Option<String>,
}

impl StatusApiResponse {
    /// Interpret the response for the target server.
    fn into_outcome(self) -> ProbeOutcome {
        if !self.online {
            return ProbeOutcome::unreachable(UnreachableReason::Unknown);
        }

        let Some(latency) = self.round_trip_latency.filter(|l| l.is_finite()) else {
            return ProbeOutcome::service_error(ServiceFailure::MalformedPayload(
                "online server without round_trip_latency".to_string(),
            ));
        };

        ProbeOutcome::Reachable {
            latency_ms: latency.max(0.0).round() as u64,
            metadata: Some(ServerMetadata {
                players_online: self.players.as_ref().and_then(|p| p.online),
                players_max: self.players.as_ref().and_then(|p| p.max),
                motd: self.motd.and_then(|m| m.clean),
                version: self.version.and_then(|v| v.name),
            }),
        }
    }
}

/// The URL queried for `endpoint`.
#[must_use]
pub fn status_url(api: &StatusApiConfig, endpoint: &Endpoint) -> String {
    format!(
        "{}/v2/status/{}/{}",
        api.base_url.trim_end_matches('/'),
        api.edition.api_variant(),
        endpoint
    )
}

/// Probes through the configured status API.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusApiProbe;

impl StatusApiProbe {
    async fn lookup(endpoint: &Endpoint, config: &ProbeConfig) -> ProbeOutcome {
        let client = match Client::builder().timeout(config.timeout).build() {
            Ok(client) => client,
            Err(err) => return ProbeOutcome::service_error(ServiceFailure::Transport(err.to_string())),
        };

        let url = status_url(&config.status_api, endpoint);
        debug!(%url, "querying status api");

        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return ProbeOutcome::service_error(ServiceFailure::Timeout);
            }
            Err(err) => {
                debug!(%url, error = %err, "status api request failed");
                return ProbeOutcome::service_error(ServiceFailure::Transport(err.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "status api returned an error status");
            return ProbeOutcome::service_error(ServiceFailure::HttpStatus(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) if err.is_timeout() => {
                return ProbeOutcome::service_error(ServiceFailure::Timeout);
            }
            Err(err) => {
                return ProbeOutcome::service_error(ServiceFailure::Transport(err.to_string()));
            }
        };

        match serde_json::from_slice::<StatusApiResponse>(&body) {
            Ok(parsed) => parsed.into_outcome(),
            Err(err) => ProbeOutcome::service_error(ServiceFailure::MalformedPayload(err.to_string())),
        }
    }
}

#[async_trait]
impl Probe for StatusApiProbe {
    fn name(&self) -> &'static str {
        "status-api"
    }

    async fn probe(&self, endpoint: &Endpoint, config: &ProbeConfig) -> ProbeOutcome {
        timeout(config.timeout, Self::lookup(endpoint, config))
            .await
            .unwrap_or_else(|_| self.timeout_outcome())
    }

    /// A timeout here means the service did not answer, not the target.
    fn timeout_outcome(&self) -> ProbeOutcome {
        ProbeOutcome::service_error(ServiceFailure::Timeout)
    }
}
