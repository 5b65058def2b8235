//! TCP connect timing.
//!
//! This measures how long the transport handshake takes, optionally followed
//! by one Server List Ping round trip. It says nothing about how the game
//! itself responds, and it cannot probe games that only speak UDP (such as
//! Bedrock servers): those will usually look refused or timed out.

use super::{millis, slp, Probe};
use crate::{
    config::ProbeConfig,
    endpoint::Endpoint,
    outcome::{ProbeOutcome, UnreachableReason},
};
use async_trait::async_trait;
use std::{
    io::{self, ErrorKind},
    time::Instant,
};
use tokio::{net::TcpStream, time::timeout};
use tracing::debug;

/// Times a TCP connection to the endpoint.
///
/// With [`ProbeConfig::tcp_echo`] set, the latency also includes one
/// ping/pong exchange over the connection, which is closer to what a Java
/// client would see than a bare handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl TcpProbe {
    async fn measure(endpoint: &Endpoint, echo: bool) -> io::Result<ProbeOutcome> {
        let start = Instant::now();
        let mut stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;
        let connected = start.elapsed();

        debug!(%endpoint, connect_ms = millis(connected), "tcp connected");

        if !echo {
            return Ok(ProbeOutcome::reachable(millis(connected)));
        }

        let echo = slp::echo(&mut stream, endpoint.host(), endpoint.port())
            .await
            .map_err(hangup_is_protocol_error)?;
        debug!(%endpoint, echo_ms = millis(echo.round_trip), "tcp echo complete");

        Ok(ProbeOutcome::Reachable {
            latency_ms: millis(connected + echo.round_trip),
            metadata: Some(echo.metadata),
        })
    }
}

/// Hangups after a successful connect become `InvalidData`: the peer took
/// the connection but did not speak the protocol.
fn hangup_is_protocol_error(err: io::Error) -> io::Error {
    match err.kind() {
        ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof => {
            io::Error::new(ErrorKind::InvalidData, err)
        }
        _ => err,
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn probe(&self, endpoint: &Endpoint, config: &ProbeConfig) -> ProbeOutcome {
        match timeout(config.timeout, Self::measure(endpoint, config.tcp_echo)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                debug!(%endpoint, error = %err, "tcp probe failed");
                ProbeOutcome::unreachable(UnreachableReason::from_io(&err))
            }
            Err(_) => self.timeout_outcome(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{hangup_is_protocol_error, TcpProbe};
    use crate::{
        config::{ProbeConfig, Strategy},
        endpoint::Endpoint,
        outcome::{ProbeOutcome, UnreachableReason},
        probe::{slp::tests::serve_one, Probe},
    };
    use std::{
        io::{self, ErrorKind},
        time::{Duration, Instant},
    };
    use tokio::net::TcpListener;

    fn endpoint(port: u16) -> Endpoint {
        Endpoint::parse(&format!("127.0.0.1:{port}")).unwrap()
    }

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = ProbeConfig::new(Strategy::Tcp);
        let outcome = TcpProbe.probe(&endpoint(port), &config).await;

        assert!(matches!(outcome, ProbeOutcome::Reachable { metadata: None, .. }));
        assert!(outcome.latency_ms().unwrap() < 1000);
    }

    #[tokio::test]
    async fn test_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ProbeConfig::new(Strategy::Tcp);
        let outcome = TcpProbe.probe(&endpoint(port), &config).await;

        assert_eq!(
            outcome,
            ProbeOutcome::unreachable(UnreachableReason::ConnectionRefused)
        );
    }

    #[tokio::test]
    async fn test_echo_with_metadata() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_one(&mut stream, false).await;
        });

        let config = ProbeConfig::new(Strategy::Tcp).with_tcp_echo(true);
        let outcome = TcpProbe.probe(&endpoint(port), &config).await;
        server.await.unwrap();

        let ProbeOutcome::Reachable { metadata, .. } = outcome else {
            panic!("expected reachable, got {outcome:?}");
        };
        let metadata = metadata.unwrap();
        assert_eq!(metadata.version.as_deref(), Some("1.20.4"));
        assert_eq!(metadata.players_online, Some(2));
    }

    #[tokio::test]
    async fn test_echo_hangup_is_protocol_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            // hang up without answering
            drop(stream);
        });

        let config = ProbeConfig::new(Strategy::Tcp).with_tcp_echo(true);
        let outcome = TcpProbe.probe(&endpoint(port), &config).await;
        server.await.unwrap();

        assert_eq!(
            outcome,
            ProbeOutcome::unreachable(UnreachableReason::ProtocolError)
        );
    }

    #[test]
    fn test_hangup_kinds_become_invalid_data() {
        for kind in [
            ErrorKind::ConnectionReset,
            ErrorKind::BrokenPipe,
            ErrorKind::UnexpectedEof,
        ] {
            let err = hangup_is_protocol_error(io::Error::new(kind, "hangup"));
            assert_eq!(err.kind(), ErrorKind::InvalidData, "{kind:?}");
        }

        let err = hangup_is_protocol_error(io::Error::new(ErrorKind::TimedOut, "slow"));
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let config = ProbeConfig::new(Strategy::Tcp)
            .with_tcp_echo(true)
            .with_timeout(Duration::from_millis(200));

        let start = Instant::now();
        let outcome = TcpProbe.probe(&endpoint(port), &config).await;

        assert_eq!(outcome, ProbeOutcome::unreachable(UnreachableReason::Timeout));
        assert!(start.elapsed() < Duration::from_secs(2));
        server.abort();
    }
}
