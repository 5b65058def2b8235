//! Native Bedrock status query: a RakNet
//! [Unconnected Ping](https://wiki.vg/Raknet_Protocol#Unconnected_Ping) over UDP.

use super::{millis, Probe};
use crate::{
    config::ProbeConfig,
    endpoint::Endpoint,
    errors::RakNetProtocolError,
    outcome::{ProbeOutcome, ServerMetadata, ServiceFailure, UnreachableReason},
};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio::{
    io,
    net::{lookup_host, UdpSocket},
    time::timeout,
};
use tracing::debug;

const UNCONNECTED_PING: u8 = 0x01;
const UNCONNECTED_PONG: u8 = 0x1c;

/// Marks offline (unconnected) RakNet messages.
const OFFLINE_MAGIC: [u8; 16] = [
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

/// id + timestamp + server guid + magic + string length
const PONG_HEADER_LEN: usize = 1 + 8 + 8 + OFFLINE_MAGIC.len() + 2;

/// Larger than any pong a server will fit into one datagram.
const RECV_BUFFER_LEN: usize = 2048;

/// Encode an unconnected ping.
fn encode_ping(timestamp: i64, client_guid: i64) -> Bytes {
    let mut bytes = BytesMut::with_capacity(1 + 8 + OFFLINE_MAGIC.len() + 8);

    bytes.put_u8(UNCONNECTED_PING);
    bytes.put_i64(timestamp);
    bytes.put_slice(&OFFLINE_MAGIC);
    bytes.put_i64(client_guid);

    bytes.freeze()
}

/// Decode an unconnected pong, checking it answers the ping sent with
/// `timestamp`. Returns the server guid and the advertisement string.
fn decode_pong(mut bytes: Bytes, timestamp: i64) -> Result<(i64, String), RakNetProtocolError> {
    if bytes.is_empty() {
        return Err(RakNetProtocolError::Truncated);
    }

    let id = bytes.get_u8();
    if id != UNCONNECTED_PONG {
        return Err(RakNetProtocolError::UnexpectedPacketId(id));
    }

    if bytes.remaining() < PONG_HEADER_LEN - 1 {
        return Err(RakNetProtocolError::Truncated);
    }

    if bytes.get_i64() != timestamp {
        return Err(RakNetProtocolError::TimestampMismatch);
    }

    let server_guid = bytes.get_i64();

    if bytes.split_to(OFFLINE_MAGIC.len()) != OFFLINE_MAGIC[..] {
        return Err(RakNetProtocolError::InvalidMagic);
    }

    let len = bytes.get_u16() as usize;
    if bytes.remaining() < len {
        return Err(RakNetProtocolError::Truncated);
    }

    let advertisement = String::from_utf8(bytes.split_to(len).to_vec())
        .map_err(|_| RakNetProtocolError::InvalidAdvertisement)?;

    Ok((server_guid, advertisement))
}

/// Fields of the semicolon separated server advertisement.
///
/// The layout is `edition;motd;protocol;version;online;max;server id;sub motd;game mode;...`.
/// Servers are inconsistent about trailing fields, so everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advertisement {
    /// `MCPE` or `MCEE`.
    pub edition: Option<String>,
    /// First line of the message of the day.
    pub motd: Option<String>,
    /// Network protocol number.
    pub protocol: Option<u32>,
    /// Game version name.
    pub version: Option<String>,
    /// Players online.
    pub players_online: Option<u32>,
    /// Player limit.
    pub players_max: Option<u32>,
}

impl Advertisement {
    /// Parse an advertisement string. Never fails; missing or unparsable
    /// fields are `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let fields = raw.split(';').collect::<Vec<_>>();
        let text = |i: usize| {
            fields
                .get(i)
                .filter(|s| !s.is_empty())
                .map(|s| (*s).to_string())
        };
        let number = |i: usize| fields.get(i).and_then(|s| s.parse::<u32>().ok());

        Self {
            edition: text(0),
            motd: text(1),
            protocol: number(2),
            version: text(3),
            players_online: number(4),
            players_max: number(5),
        }
    }
}

impl From<Advertisement> for ServerMetadata {
    fn from(ad: Advertisement) -> Self {
        Self {
            players_online: ad.players_online,
            players_max: ad.players_max,
            motd: ad.motd,
            version: ad.version,
        }
    }
}

/// A server's answer to an unconnected ping.
#[derive(Debug, Clone)]
pub struct Pong {
    /// Time from sending the ping to recieving this pong.
    pub latency: Duration,
    /// The server's RakNet guid.
    pub server_guid: i64,
    /// Parsed advertisement.
    pub advertisement: Advertisement,
}

/// Resolve `host:port` to the first address the resolver returns.
async fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    lookup_host((host, port)).await?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no addresses for {host}"))
    })
}

/// Bind a local socket of the right family and connect it to `addr`, so
/// ICMP errors for `addr` surface on recv.
async fn connect_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;

    Ok(socket)
}

/// Send one ping and wait for one datagram back.
async fn exchange(socket: &UdpSocket) -> io::Result<Pong> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    let ping = encode_ping(timestamp, rand::random());

    let start = Instant::now();
    socket.send(&ping).await?;

    let mut buffer = vec![0; RECV_BUFFER_LEN];
    let len = socket.recv(&mut buffer).await?;
    let latency = start.elapsed();

    buffer.truncate(len);
    let (server_guid, advertisement) = decode_pong(Bytes::from(buffer), timestamp)?;

    Ok(Pong {
        latency,
        server_guid,
        advertisement: Advertisement::parse(&advertisement),
    })
}

/// Ping a Bedrock server and wait for its pong.
///
/// # Arguments
/// * `host` - A string slice that holds the hostname of the server to ping.
/// * `port` - The port to ping on that server.
///
/// Without a timeout this waits forever for a server that never answers;
/// prefer [`ping_with_timeout`].
///
/// # Errors
/// Returns `Err` if the name does not resolve, the socket fails, or the reply
/// is not a valid pong ([`RakNetProtocolError`] as
/// [`io::ErrorKind::InvalidData`]).
pub async fn ping(host: &str, port: u16) -> io::Result<Pong> {
    let addr = resolve(host, port).await?;
    let socket = connect_socket(addr).await?;

    exchange(&socket).await
}

create_timeout!(ping, Pong);

/// Probes Bedrock servers with a RakNet unconnected ping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RakNetProbe;

impl RakNetProbe {
    async fn measure(endpoint: &Endpoint) -> ProbeOutcome {
        let addr = match resolve(endpoint.host(), endpoint.port()).await {
            Ok(addr) => addr,
            Err(err) => {
                debug!(%endpoint, error = %err, "name resolution failed");
                return ProbeOutcome::unreachable(UnreachableReason::Unknown);
            }
        };

        let socket = match connect_socket(addr).await {
            Ok(socket) => socket,
            Err(err) => {
                debug!(%endpoint, error = %err, "could not open udp socket");
                return ProbeOutcome::service_error(ServiceFailure::Transport(err.to_string()));
            }
        };

        match exchange(&socket).await {
            Ok(pong) => {
                debug!(
                    %endpoint,
                    latency_ms = millis(pong.latency),
                    server_guid = pong.server_guid,
                    "raknet pong"
                );

                ProbeOutcome::Reachable {
                    latency_ms: millis(pong.latency),
                    metadata: Some(pong.advertisement.into()),
                }
            }
            Err(err) => {
                debug!(%endpoint, error = %err, "raknet ping failed");
                ProbeOutcome::unreachable(UnreachableReason::from_io(&err))
            }
        }
    }
}

#[async_trait]
impl Probe for RakNetProbe {
    fn name(&self) -> &'static str {
        "raknet"
    }

    async fn probe(&self, endpoint: &Endpoint, config: &ProbeConfig) -> ProbeOutcome {
        timeout(config.timeout, Self::measure(endpoint))
            .await
            .unwrap_or_else(|_| self.timeout_outcome())
    }
}
