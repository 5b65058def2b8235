//! A minimal [Server List Ping](https://wiki.vg/Server_List_Ping) exchange,
//! used by the TCP strategy to time one application-level round trip.

use crate::{
    errors::SlpProtocolError,
    outcome::ServerMetadata,
    socket::ReadSlpTypes,
    varint::{put_varint, varint_len},
};
use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy)]
pub(super) enum PacketId {
    Handshake = 0,
    Ping = 1,
}

impl PacketId {
    /// Status requests and responses reuse the handshake id.
    pub(super) const STATUS: Self = Self::Handshake;
}

/// Builds a length-prefixed serverbound packet.
#[derive(Debug)]
pub(super) struct PacketBuilder {
    id: PacketId,
    payload: BytesMut,
}

impl PacketBuilder {
    pub(super) fn new(id: PacketId) -> Self {
        Self {
            id,
            payload: BytesMut::new(),
        }
    }

    pub(super) fn add_varint(mut self, value: i32) -> Self {
        put_varint(&mut self.payload, value);
        self
    }

    pub(super) fn add_string(mut self, string: &str) -> Self {
        put_varint(&mut self.payload, string.len() as i32);
        self.payload.put(string.as_bytes());
        self
    }

    pub(super) fn add_u16(mut self, short: u16) -> Self {
        self.payload.put_u16(short);
        self
    }

    pub(super) fn add_i64(mut self, long: i64) -> Self {
        self.payload.put_i64(long);
        self
    }

    pub(super) fn build(self) -> Bytes {
        let id = self.id as i32;
        let len = (varint_len(id) + self.payload.len()) as i32;

        let mut bytes = BytesMut::with_capacity(varint_len(len) + len as usize);
        put_varint(&mut bytes, len);
        put_varint(&mut bytes, id);
        bytes.extend_from_slice(&self.payload);

        bytes.freeze()
    }
}

/// The subset of the status response JSON we display.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    version: Option<Version>,
    players: Option<Players>,
    description: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Version {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Players {
    max: u32,
    online: u32,
}

impl From<StatusResponse> for ServerMetadata {
    fn from(status: StatusResponse) -> Self {
        Self {
            players_online: status.players.as_ref().map(|p| p.online),
            players_max: status.players.as_ref().map(|p| p.max),
            motd: status.description.as_ref().map(flatten_chat),
            version: status.version.map(|v| v.name),
        }
    }
}

/// Collapse a chat component (string, object, or array) into plain text.
fn flatten_chat(value: &serde_json::Value) -> String {
    fn walk(value: &serde_json::Value, out: &mut String) {
        match value {
            serde_json::Value::String(s) => out.push_str(s),
            serde_json::Value::Array(parts) => parts.iter().for_each(|p| walk(p, out)),
            serde_json::Value::Object(obj) => {
                if let Some(text) = obj.get("text") {
                    walk(text, out);
                }
                if let Some(extra) = obj.get("extra") {
                    walk(extra, out);
                }
            }
            _ => {}
        }
    }

    let mut out = String::new();
    walk(value, &mut out);
    out
}

/// Result of an echo exchange.
#[derive(Debug)]
pub(super) struct Echo {
    /// Time from sending the ping request to reading the matching pong.
    pub(super) round_trip: Duration,
    pub(super) metadata: ServerMetadata,
}

/// Run status request then ping/pong on an already connected stream.
///
/// # Errors
/// Returns `Err` on I/O failure or when the server's replies do not follow
/// the protocol ([`SlpProtocolError`], as [`io::ErrorKind::InvalidData`]).
pub(super) async fn echo<S>(stream: &mut S, host: &str, port: u16) -> io::Result<Echo>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    // https://wiki.vg/Server_List_Ping#Handshake
    let handshake = PacketBuilder::new(PacketId::Handshake)
        .add_varint(-1)
        .add_string(host)
        .add_u16(port)
        .add_varint(1)
        .build();
    let status_request = PacketBuilder::new(PacketId::STATUS).build();

    stream.write_all(&handshake).await?;
    stream.write_all(&status_request).await?;

    // https://wiki.vg/Server_List_Ping#Status_Response
    let _len = stream.read_varint().await?;
    expect_id(stream.read_varint().await?, PacketId::STATUS)?;
    let json = stream.read_mc_string().await?;

    let status = serde_json::from_str::<StatusResponse>(&json)
        .map_err(|_| SlpProtocolError::InvalidStatusResponse)?;

    // https://wiki.vg/Server_List_Ping#Ping_Request
    let payload = rand::random::<i64>();
    let ping = PacketBuilder::new(PacketId::Ping).add_i64(payload).build();

    let start = Instant::now();
    stream.write_all(&ping).await?;

    let _len = stream.read_varint().await?;
    expect_id(stream.read_varint().await?, PacketId::Ping)?;
    if stream.read_i64().await? != payload {
        return Err(SlpProtocolError::PayloadMismatch.into());
    }
    let round_trip = start.elapsed();

    // the server closes the connection after the pong, a failed shutdown is harmless
    let _ = stream.shutdown().await;

    Ok(Echo {
        round_trip,
        metadata: status.into(),
    })
}

fn expect_id(id: i32, expected: PacketId) -> io::Result<()> {
    if id == expected as i32 {
        Ok(())
    } else {
        Err(SlpProtocolError::UnexpectedPacketId(id).into())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{echo, flatten_chat, PacketBuilder, PacketId};
    use crate::{socket::ReadSlpTypes, varint::put_varint};
    use bytes::{BufMut, BytesMut};
    use std::io::ErrorKind;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    /// Status JSON served by [`serve_one`].
    pub(crate) const STATUS_JSON: &str = r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":2},"description":{"text":"A ","extra":[{"text":"Server"}]}}"#;

    fn response(id: i32, body: &[u8]) -> BytesMut {
        let mut inner = BytesMut::new();
        put_varint(&mut inner, id);
        inner.put_slice(body);

        let mut packet = BytesMut::new();
        put_varint(&mut packet, inner.len() as i32);
        packet.put_slice(&inner);
        packet
    }

    /// Play the server side of one status + ping exchange. When
    /// `corrupt_pong` is set the pong payload is altered.
    pub(crate) async fn serve_one(stream: &mut TcpStream, corrupt_pong: bool) {
        // handshake
        let len = stream.read_varint().await.unwrap();
        let mut skip = vec![0; len as usize];
        stream.read_exact(&mut skip).await.unwrap();
        // status request
        assert_eq!(stream.read_varint().await.unwrap(), 1);
        assert_eq!(stream.read_varint().await.unwrap(), 0);

        let mut body = BytesMut::new();
        put_varint(&mut body, STATUS_JSON.len() as i32);
        body.put_slice(STATUS_JSON.as_bytes());
        stream.write_all(&response(0, &body)).await.unwrap();

        // ping
        assert_eq!(stream.read_varint().await.unwrap(), 9);
        assert_eq!(stream.read_varint().await.unwrap(), 1);
        let mut payload = stream.read_i64().await.unwrap();
        if corrupt_pong {
            payload = payload.wrapping_add(1);
        }
        stream
            .write_all(&response(1, &payload.to_be_bytes()))
            .await
            .unwrap();
    }

    #[test]
    fn test_handshake_bytes() {
        let packet = PacketBuilder::new(PacketId::Handshake)
            .add_varint(-1)
            .add_string("localhost")
            .add_u16(25565)
            .add_varint(1)
            .build();

        let mut expected = vec![0x13, 0x00, 0xff, 0xff, 0xff, 0xff, 0x0f, 0x09];
        expected.extend_from_slice(b"localhost");
        expected.extend_from_slice(&[0x63, 0xdd, 0x01]);

        assert_eq!(&packet[..], &expected[..]);
        assert_eq!(&PacketBuilder::new(PacketId::STATUS).build()[..], b"\x01\x00");
    }

    #[test]
    fn test_flatten_chat() {
        let value: serde_json::Value =
            serde_json::from_str(r#"[{"text":"a"},"b",{"extra":[{"text":"c"}]}]"#).unwrap();
        assert_eq!(flatten_chat(&value), "abc");
    }

    #[tokio::test]
    async fn test_echo_against_fake_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_one(&mut stream, false).await;
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let result = echo(&mut stream, "localhost", addr.port()).await.unwrap();
        server.await.unwrap();

        assert_eq!(result.metadata.version.as_deref(), Some("1.20.4"));
        assert_eq!(result.metadata.players_online, Some(2));
        assert_eq!(result.metadata.players_max, Some(20));
        assert_eq!(result.metadata.motd.as_deref(), Some("A Server"));
    }

    #[tokio::test]
    async fn test_echo_payload_mismatch() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_one(&mut stream, true).await;
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let err = echo(&mut stream, "localhost", addr.port()).await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
